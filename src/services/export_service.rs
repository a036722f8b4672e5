// src/services/export_service.rs
//
// Exportação das listagens em CSV, XLSX e PDF.

use std::path::PathBuf;

use chrono::{NaiveDate, Utc};
use genpdf::{elements, style, Element};
use rust_xlsxwriter::{Format, Workbook};

use crate::{
    common::error::AppError,
    models::{
        carrier::Carrier,
        employee::Employee,
        listing::ExportFormat,
        party::Party,
        product::Product,
        records::Address,
    },
};

/// Uma linha exportável: cabeçalhos fixos e células já formatadas.
pub trait Exportable {
    fn headers() -> &'static [&'static str];
    fn cells(&self) -> Vec<String>;
}

#[derive(Debug)]
pub struct ExportFile {
    pub filename: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// `{entidade}_{AAAA-MM-DD}.{ext}`
pub fn export_filename(entity: &str, date: NaiveDate, format: ExportFormat) -> String {
    format!("{}_{}.{}", entity, date.format("%Y-%m-%d"), format.extension())
}

#[derive(Clone)]
pub struct ExportService {
    fonts_dir: PathBuf,
}

impl ExportService {
    pub fn new(fonts_dir: impl Into<PathBuf>) -> Self {
        Self { fonts_dir: fonts_dir.into() }
    }

    pub fn export<T: Exportable>(
        &self,
        entity: &str,
        title: &str,
        format: ExportFormat,
        rows: &[T],
    ) -> Result<ExportFile, AppError> {
        // Sem linhas não há arquivo
        if rows.is_empty() {
            return Err(AppError::EmptyExport);
        }

        let bytes = match format {
            ExportFormat::Csv => to_csv(rows)?,
            ExportFormat::Xlsx => to_xlsx(title, rows)?,
            ExportFormat::Pdf => self.to_pdf(title, rows)?,
        };

        tracing::info!("📤 Exportação {} ({} linhas, {})", entity, rows.len(), format.extension());

        Ok(ExportFile {
            filename: export_filename(entity, Utc::now().date_naive(), format),
            content_type: format.content_type(),
            bytes,
        })
    }

    fn to_pdf<T: Exportable>(&self, title: &str, rows: &[T]) -> Result<Vec<u8>, AppError> {
        let font_family = genpdf::fonts::from_files(&self.fonts_dir, "Roboto", None).map_err(|_| {
            AppError::FontNotFound(format!("Fonte Roboto não encontrada em {}", self.fonts_dir.display()))
        })?;

        let mut doc = genpdf::Document::new(font_family);
        doc.set_title(title);
        doc.set_font_size(8);
        let mut decorator = genpdf::SimplePageDecorator::new();
        decorator.set_margins(10);
        doc.set_page_decorator(decorator);

        doc.push(elements::Paragraph::new(title).styled(style::Style::new().bold().with_font_size(14)));
        doc.push(elements::Paragraph::new(format!(
            "Gerado em {} ({} registros)",
            Utc::now().format("%d/%m/%Y %H:%M"),
            rows.len()
        )));
        doc.push(elements::Break::new(1));

        let headers = T::headers();
        let mut table = elements::TableLayout::new(vec![1; headers.len()]);
        table.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));

        let bold = style::Style::new().bold();
        let mut header_row = table.row();
        for h in headers {
            header_row.push_element(elements::Paragraph::new(*h).styled(bold));
        }
        header_row.push().map_err(pdf_error)?;

        for item in rows {
            let mut row = table.row();
            for cell in item.cells() {
                row.push_element(elements::Paragraph::new(cell));
            }
            row.push().map_err(pdf_error)?;
        }
        doc.push(table);

        let mut buffer = Vec::new();
        doc.render(&mut buffer).map_err(pdf_error)?;
        Ok(buffer)
    }
}

fn pdf_error(e: genpdf::error::Error) -> AppError {
    AppError::InternalServerError(anyhow::Error::msg(e.to_string()))
}

pub fn to_csv<T: Exportable>(rows: &[T]) -> Result<Vec<u8>, AppError> {
    // BOM + ';' para o Excel em pt-BR abrir direto
    let mut out = vec![0xEF, 0xBB, 0xBF];
    {
        let mut writer = csv::WriterBuilder::new().delimiter(b';').from_writer(&mut out);
        writer.write_record(T::headers()).map_err(anyhow::Error::from)?;
        for row in rows {
            writer.write_record(row.cells()).map_err(anyhow::Error::from)?;
        }
        writer.flush().map_err(anyhow::Error::from)?;
    }
    Ok(out)
}

pub fn to_xlsx<T: Exportable>(title: &str, rows: &[T]) -> Result<Vec<u8>, AppError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let sheet = workbook.add_worksheet();
    // Nome de aba: até 31 caracteres
    let sheet_name: String = title.chars().take(31).collect();
    sheet.set_name(&sheet_name).map_err(anyhow::Error::from)?;

    for (col, header) in T::headers().iter().enumerate() {
        sheet
            .write_string_with_format(0, col as u16, *header, &bold)
            .map_err(anyhow::Error::from)?;
    }
    for (i, row) in rows.iter().enumerate() {
        for (col, cell) in row.cells().iter().enumerate() {
            sheet
                .write_string(i as u32 + 1, col as u16, cell)
                .map_err(anyhow::Error::from)?;
        }
    }
    sheet.autofit();

    let bytes = workbook.save_to_buffer().map_err(anyhow::Error::from)?;
    Ok(bytes)
}

// ---
// Colunas de cada cadastro
// ---

fn opt(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn city_state(address: Option<&Address>) -> String {
    match address {
        Some(a) if !a.city.is_empty() => format!("{}/{}", a.city, a.state),
        _ => String::new(),
    }
}

impl Exportable for Party {
    fn headers() -> &'static [&'static str] {
        &["Nome", "Tipo", "Documento", "E-mail", "Telefone", "Cidade/UF", "Limite de crédito", "Situação"]
    }

    fn cells(&self) -> Vec<String> {
        let main = self.addresses.0.iter().find(|a| a.is_main).or(self.addresses.0.first());
        vec![
            self.name.clone(),
            self.person_type.as_str().to_string(),
            self.document.clone(),
            opt(&self.email),
            opt(&self.phone),
            city_state(main),
            format!("{:.2}", self.credit_limit),
            self.status.as_str().to_string(),
        ]
    }
}

impl Exportable for Employee {
    fn headers() -> &'static [&'static str] {
        &["Nome", "CPF", "Cargo", "Departamento", "Salário", "Admissão", "Desligamento", "Situação"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.cpf.clone(),
            self.position.clone(),
            opt(&self.department),
            format!("{:.2}", self.salary),
            self.hire_date.format("%d/%m/%Y").to_string(),
            self.termination_date.map(|d| d.format("%d/%m/%Y").to_string()).unwrap_or_default(),
            self.status.as_str().to_string(),
        ]
    }
}

impl Exportable for Carrier {
    fn headers() -> &'static [&'static str] {
        &["Nome", "Documento", "RNTRC", "Placa", "Veículo", "Telefone", "Cidade/UF", "Situação"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.document.clone(),
            opt(&self.rntrc),
            opt(&self.vehicle_plate),
            opt(&self.vehicle_type),
            opt(&self.phone),
            city_state(self.address.as_ref().map(|a| &a.0)),
            self.status.as_str().to_string(),
        ]
    }
}

impl Exportable for Product {
    fn headers() -> &'static [&'static str] {
        &["SKU", "Nome", "Categoria", "Custo", "Preço de venda", "Estoque", "NCM", "Situação"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.sku.clone(),
            self.name.clone(),
            opt(&self.category),
            format!("{:.2}", self.cost_price),
            format!("{:.2}", self.sale_price),
            self.stock_quantity.normalize().to_string(),
            opt(&self.ncm),
            self.status.as_str().to_string(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Row(&'static str, u32);

    impl Exportable for Row {
        fn headers() -> &'static [&'static str] {
            &["Nome", "Qtd"]
        }
        fn cells(&self) -> Vec<String> {
            vec![self.0.to_string(), self.1.to_string()]
        }
    }

    #[test]
    fn csv_has_header_and_rows() {
        let bytes = to_csv(&[Row("Camiseta; P", 3), Row("Boné", 1)]).unwrap();
        let text = String::from_utf8(bytes[3..].to_vec()).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("Nome;Qtd"));
        // campo com o separador vai entre aspas
        assert_eq!(lines.next(), Some("\"Camiseta; P\";3"));
        assert_eq!(lines.next(), Some("Boné;1"));
    }

    #[test]
    fn xlsx_is_a_zip_container() {
        let bytes = to_xlsx("Produtos", &[Row("Camiseta", 3)]).unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn empty_export_is_rejected() {
        let service = ExportService::new("./fonts");
        let rows: Vec<Row> = Vec::new();
        let result = service.export("clientes", "Clientes", ExportFormat::Csv, &rows);
        assert!(matches!(result, Err(AppError::EmptyExport)));
    }

    #[test]
    fn filename_pattern() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
        assert_eq!(export_filename("clientes", date, ExportFormat::Xlsx), "clientes_2025-03-07.xlsx");
        assert_eq!(export_filename("produtos", date, ExportFormat::Pdf), "produtos_2025-03-07.pdf");
    }

    #[test]
    fn export_names_the_file_with_today() {
        let service = ExportService::new("./fonts");
        let file = service.export("fornecedores", "Fornecedores", ExportFormat::Csv, &[Row("X", 1)]).unwrap();
        let today = Utc::now().date_naive().format("%Y-%m-%d").to_string();
        assert_eq!(file.filename, format!("fornecedores_{}.csv", today));
        assert!(file.content_type.starts_with("text/csv"));
    }
}
