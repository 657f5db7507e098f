// src/services/document_service.rs

use genpdf::{elements, style, Element};
use image::Luma;
use qrcode::QrCode;
use rust_decimal::Decimal;
use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::RequestRepository,
    models::requests::RequestStatus,
};

#[derive(Clone)]
pub struct DocumentService {
    repo: RequestRepository,
}

impl DocumentService {
    pub fn new(repo: RequestRepository) -> Self {
        Self { repo }
    }

    // Ato de serviço concluído: cabeçalho, tabela de itens, total e um
    // QR Code com a referência da solicitação para conferência.
    pub async fn generate_completion_act<'e, E>(
        &self,
        executor: E,
        request_id: Uuid,
    ) -> Result<Vec<u8>, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        // 1. Busca os dados
        let mut tx = executor.begin().await?;
        let request = self
            .repo
            .get(&mut *tx, request_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Solicitação".to_string()))?;
        let items = self.repo.list_item_details(&mut *tx, request_id).await?;
        tx.commit().await?;

        if request.status != RequestStatus::Completed {
            return Err(AppError::Forbidden(
                "O ato só está disponível para solicitações concluídas.".to_string(),
            ));
        }

        let (_, accepted_by_name) = self.repo.get_employee_names(request_id).await?;

        // 2. Configura o PDF
        // Carrega a fonte da pasta 'fonts/'
        let font_family = genpdf::fonts::from_files("./fonts", "Roboto", None)
            .map_err(|_| AppError::FontNotFound("Fonte não encontrada na pasta ./fonts".to_string()))?;

        let mut doc = genpdf::Document::new(font_family);
        doc.set_title(format!("Ato de serviço — solicitação {}", request.id));
        let mut decorator = genpdf::SimplePageDecorator::new();
        decorator.set_margins(10);
        doc.set_page_decorator(decorator);

        doc.push(
            elements::Paragraph::new("ATO DE SERVIÇO CONCLUÍDO")
                .styled(style::Style::new().bold().with_font_size(18)),
        );

        doc.push(elements::Break::new(1.5));

        doc.push(elements::Paragraph::new(format!("Solicitação: {}", request.id)));
        if let Some(completed_at) = request.completed_at {
            doc.push(elements::Paragraph::new(format!(
                "Concluída em: {}",
                completed_at.format("%d/%m/%Y %H:%M")
            )));
        }
        doc.push(elements::Paragraph::new(format!("Cliente: {}", request.customer_name)));
        doc.push(elements::Paragraph::new(format!("Endereço: {}", request.address)));
        doc.push(elements::Paragraph::new(format!("Problema: {}", request.problem)));

        if let Some(executor_name) = accepted_by_name {
            doc.push(elements::Paragraph::new(format!("Executado por: {}", executor_name)));
        }

        doc.push(elements::Break::new(2));

        // --- TABELA DE ITENS ---
        // Pesos das colunas: Nome (4), Qtd (1), Preço (2), Total (2)
        let mut table = elements::TableLayout::new(vec![4, 1, 2, 2]);
        table.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));

        let style_bold = style::Style::new().bold();
        table
            .row()
            .element(elements::Paragraph::new("Item").styled(style_bold))
            .element(elements::Paragraph::new("Qtd").styled(style_bold))
            .element(elements::Paragraph::new("Unitário").styled(style_bold))
            .element(elements::Paragraph::new("Total").styled(style_bold))
            .push()
            .expect("Table error");

        let mut grand_total = Decimal::ZERO;
        for item in &items {
            let line_total = item.price * item.quantity;
            grand_total += line_total;

            table
                .row()
                .element(elements::Paragraph::new(item.product_name.clone()))
                .element(elements::Paragraph::new(format!("{:.2}", item.quantity)))
                .element(elements::Paragraph::new(format!("{:.2}", item.price)))
                .element(elements::Paragraph::new(format!("{:.2}", line_total)))
                .push()
                .expect("Table row error");
        }

        doc.push(table);
        doc.push(elements::Break::new(2));

        // --- TOTAL ---
        let mut total_paragraph =
            elements::Paragraph::new(format!("TOTAL GERAL: {:.2}", grand_total));
        total_paragraph.set_alignment(genpdf::Alignment::Right);
        doc.push(total_paragraph.styled(style::Style::new().bold().with_font_size(12)));

        doc.push(elements::Break::new(2));

        // --- RELATÓRIO DO TÉCNICO ---
        if let Some(report) = &request.work_report {
            doc.push(
                elements::Paragraph::new("Relatório do serviço")
                    .styled(style::Style::new().bold().with_font_size(12)),
            );
            doc.push(elements::Paragraph::new(report.clone()));
            doc.push(elements::Break::new(2));
        }

        // --- QR CODE DE CONFERÊNCIA ---
        // Codifica a referência da solicitação; o despacho confere pelo painel
        let code = QrCode::new(request.id.to_string().as_bytes())
            .map_err(|e| AppError::InternalServerError(anyhow::Error::msg(e.to_string())))?;

        let image_buffer = code.render::<Luma<u8>>().build();
        let dynamic_image = image::DynamicImage::ImageLuma8(image_buffer);

        let pdf_image = genpdf::elements::Image::from_dynamic_image(dynamic_image)
            .map_err(|e| AppError::InternalServerError(anyhow::Error::msg(e.to_string())))?
            .with_scale(genpdf::Scale::new(0.5, 0.5));

        doc.push(pdf_image);

        // 3. Renderiza para buffer (memória)
        let mut buffer = Vec::new();
        doc.render(&mut buffer)
            .map_err(|e| AppError::InternalServerError(anyhow::Error::msg(e.to_string())))?;

        Ok(buffer)
    }
}
