//! Screen and print layouts for a [`PrescriptionDocument`].

use serde::{Deserialize, Serialize};

use super::PrescriptionDocument;

const SCREEN_WIDTH: usize = 64;
const SIGNATURE_RULE: &str = "______________________________";

/// How a document is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    /// Plain-text preview for a terminal or text view
    Screen,
    /// Standalone HTML page with a print stylesheet
    Print,
}

/// Render a projected document.
pub fn render(doc: &PrescriptionDocument, mode: RenderMode) -> String {
    match mode {
        RenderMode::Screen => render_screen(doc),
        RenderMode::Print => render_print(doc),
    }
}

fn render_screen(doc: &PrescriptionDocument) -> String {
    let mut out = String::new();
    let rule = "=".repeat(SCREEN_WIDTH);

    out.push_str(&format!("{:^w$}\n", doc.header.institution, w = SCREEN_WIDTH));
    out.push_str(&format!("{:^w$}\n", doc.header.department, w = SCREEN_WIDTH));
    out.push_str(&format!("{:^w$}\n", doc.header.region, w = SCREEN_WIDTH));
    out.push_str(&format!("{}\n", rule));

    out.push_str("\nDados do Médico\n");
    out.push_str(&format!("  Nome: {}\n", doc.doctor.name));
    out.push_str(&format!("  CRM: {}\n", doc.doctor.crm));
    out.push_str(&format!("  Especialidade: {}\n", doc.doctor.specialty));
    if let Some(phone) = &doc.doctor.phone {
        out.push_str(&format!("  Telefone: {}\n", phone));
    }

    out.push_str("\nDados do Paciente\n");
    out.push_str(&format!("  Nome: {}\n", doc.patient.name));
    out.push_str(&format!("  CPF: {}\n", doc.patient.cpf));
    out.push_str(&format!("  Data de Nascimento: {}\n", doc.patient.birth_date));
    if let Some(sus_card) = &doc.patient.sus_card {
        out.push_str(&format!("  Cartão SUS: {}\n", sus_card));
    }

    out.push_str("\nPRESCRIÇÃO MÉDICA\n");
    for line in &doc.lines {
        out.push_str(&format!("  {}. {}\n", line.number, line.title()));
        out.push_str(&format!("     Posologia: {}\n", line.posology));
    }

    if let Some(observations) = &doc.observations {
        out.push_str("\nObservações:\n");
        for text in observations.lines() {
            out.push_str(&format!("  {}\n", text));
        }
    }

    out.push_str(&format!("\nData: {}\n", doc.issue_date));
    out.push('\n');
    out.push_str(&format!("{:>w$}\n", SIGNATURE_RULE, w = SCREEN_WIDTH));
    out.push_str(&format!("{:>w$}\n", doc.signature.name, w = SCREEN_WIDTH));
    out.push_str(&format!(
        "{:>w$}\n",
        format!("CRM: {}", doc.signature.crm),
        w = SCREEN_WIDTH
    ));

    out
}

const PRINT_STYLE: &str = r#"
  body { font-family: Arial, Helvetica, sans-serif; margin: 0; }
  .prescription-print { max-width: 56rem; margin: 0 auto; padding: 2rem; background: white; }
  .header { text-align: center; border-bottom: 2px solid #1f4788; padding-bottom: 1.5rem; margin-bottom: 2rem; }
  .grid { display: grid; grid-template-columns: 1fr 1fr; gap: 0.5rem 1rem; font-size: 0.9rem; }
  .medicine-item { border-left: 4px solid #c7d7ef; padding-left: 1rem; margin-bottom: 1rem; }
  .footer { display: flex; justify-content: space-between; align-items: flex-end; margin-top: 3rem; }
  .signature { text-align: center; }
  .signature .rule { border-top: 1px solid #888; width: 16rem; margin-bottom: 0.5rem; }
  @media print {
    .prescription-print { font-size: 12pt !important; line-height: 1.4 !important; color: black !important; background: white !important; }
    .medicine-item { page-break-inside: avoid; margin-bottom: 8pt !important; }
    h1, h2, h3, h4 { color: #1f4788 !important; page-break-after: avoid; }
    .footer { page-break-inside: avoid; }
  }
"#;

fn render_print(doc: &PrescriptionDocument) -> String {
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n");
    html.push_str("<html lang=\"pt-BR\">\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str(&format!(
        "<title>Receita {}</title>\n<style>{}</style>\n</head>\n<body>\n",
        doc.prescription_id, PRINT_STYLE
    ));
    html.push_str("<div class=\"prescription-print\">\n");

    html.push_str("<div class=\"header\">\n");
    html.push_str(&format!("<h1>{}</h1>\n", escape_html(&doc.header.institution)));
    html.push_str(&format!("<h2>{}</h2>\n", escape_html(&doc.header.department)));
    html.push_str(&format!("<p>{}</p>\n", escape_html(&doc.header.region)));
    html.push_str("</div>\n");

    html.push_str("<div class=\"doctor-info\">\n<h3>Dados do Médico</h3>\n<div class=\"grid\">\n");
    field(&mut html, "Nome", &doc.doctor.name);
    field(&mut html, "CRM", &doc.doctor.crm);
    field(&mut html, "Especialidade", &doc.doctor.specialty);
    if let Some(phone) = &doc.doctor.phone {
        field(&mut html, "Telefone", phone);
    }
    html.push_str("</div>\n</div>\n");

    html.push_str("<div class=\"patient-info\">\n<h3>Dados do Paciente</h3>\n<div class=\"grid\">\n");
    field(&mut html, "Nome", &doc.patient.name);
    field(&mut html, "CPF", &doc.patient.cpf);
    field(&mut html, "Data de Nascimento", &doc.patient.birth_date);
    if let Some(sus_card) = &doc.patient.sus_card {
        field(&mut html, "Cartão SUS", sus_card);
    }
    html.push_str("</div>\n</div>\n");

    html.push_str("<div class=\"prescription-content\">\n<h3>PRESCRIÇÃO MÉDICA</h3>\n<ol class=\"medicines-list\">\n");
    for line in &doc.lines {
        html.push_str(&format!(
            "<li class=\"medicine-item\"><div class=\"medicine-title\">{}</div><div><strong>Posologia:</strong> {}</div></li>\n",
            escape_html(&line.title()),
            escape_html(&line.posology)
        ));
    }
    html.push_str("</ol>\n");
    if let Some(observations) = &doc.observations {
        html.push_str(&format!(
            "<div class=\"observations\">\n<h4>Observações:</h4>\n<p>{}</p>\n</div>\n",
            escape_html(observations).replace('\n', "<br>")
        ));
    }
    html.push_str("</div>\n");

    html.push_str("<div class=\"footer\">\n");
    html.push_str(&format!(
        "<p><strong>Data:</strong> {}</p>\n",
        escape_html(&doc.issue_date)
    ));
    html.push_str(&format!(
        "<div class=\"signature\"><div class=\"rule\"></div><p>{}<br>CRM: {}</p></div>\n",
        escape_html(&doc.signature.name),
        escape_html(&doc.signature.crm)
    ));
    html.push_str("</div>\n");

    html.push_str("</div>\n</body>\n</html>\n");
    html
}

fn field(html: &mut String, label: &str, value: &str) {
    html.push_str(&format!(
        "<div><strong>{}:</strong> {}</div>\n",
        label,
        escape_html(value)
    ));
}

/// Escape text for inclusion in HTML element content or attributes.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::print::{
        DoctorBlock, DocumentLine, InstitutionHeader, PatientBlock, Signature, MISSING_MEDICINE,
    };

    fn document() -> PrescriptionDocument {
        PrescriptionDocument {
            prescription_id: 1,
            header: InstitutionHeader::default(),
            doctor: DoctorBlock {
                name: "Dr. João".into(),
                crm: "12345".into(),
                specialty: "Clínico Geral".into(),
                phone: Some("(44) 99999-8888".into()),
            },
            patient: PatientBlock {
                name: "Maria Silva".into(),
                cpf: "123.456.789-01".into(),
                sus_card: None,
                birth_date: "02/05/1980".into(),
            },
            lines: vec![
                DocumentLine {
                    number: 1,
                    medicine_id: 9,
                    name: "Amoxicilina".into(),
                    dosage: "500mg".into(),
                    presentation: "comprimido".into(),
                    posology: "1 comprimido a cada 8h por 7 dias".into(),
                    resolved: true,
                },
                DocumentLine {
                    number: 2,
                    medicine_id: 42,
                    name: String::new(),
                    dosage: String::new(),
                    presentation: String::new(),
                    posology: "12/12h".into(),
                    resolved: false,
                },
            ],
            observations: Some("Retornar <em>urgente</em> se febre".into()),
            issue_date: "10/01/2024".into(),
            signature: Signature {
                name: "Dr. João".into(),
                crm: "12345".into(),
            },
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("a & b"), "a &amp; b");
        assert_eq!(escape_html("<b>\"x\"</b>"), "&lt;b&gt;&quot;x&quot;&lt;/b&gt;");
        assert_eq!(escape_html("Cartão SUS"), "Cartão SUS");
    }

    #[test]
    fn test_screen_layout() {
        let text = render(&document(), RenderMode::Screen);

        assert!(text.contains("PREFEITURA MUNICIPAL DE PEROBAL"));
        assert!(text.contains("  Telefone: (44) 99999-8888"));
        assert!(!text.contains("Cartão SUS"));
        assert!(text.contains("  1. Amoxicilina - 500mg (comprimido)"));
        assert!(text.contains(&format!("  2. {}", MISSING_MEDICINE)));
        assert!(text.contains("Data: 10/01/2024"));
        assert!(text.trim_end().ends_with("CRM: 12345"));
    }

    #[test]
    fn test_print_layout_escapes_and_styles() {
        let html = render(&document(), RenderMode::Print);

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("@media print"));
        assert!(html.contains("Retornar &lt;em&gt;urgente&lt;/em&gt; se febre"));
        assert!(!html.contains("<em>"));
        assert!(html.contains("Amoxicilina - 500mg (comprimido)"));
    }

    #[test]
    fn test_modes_share_projection() {
        let doc = document();
        let screen = render(&doc, RenderMode::Screen);
        let print = render(&doc, RenderMode::Print);

        for line in &doc.lines {
            let title = line.title();
            assert!(screen.contains(&title));
            assert!(print.contains(&escape_html(&title)));
            assert!(screen.contains(&line.posology));
            assert!(print.contains(&escape_html(&line.posology)));
        }
        assert!(screen.contains(&doc.patient.cpf));
        assert!(print.contains(&doc.patient.cpf));
    }
}
