use serde::Serialize;
use tera::{Context, Tera};

use crate::error::ExportError;
use crate::record::ClinicalRecord;

/// Built-in clinical record layout. Output is the Markdown subset
/// understood by [`crate::docx::generate_docx`].
pub const CLINICAL_RECORD_TEMPLATE: &str = r#"# Prontuário Psicológico

**Profissional:** {{ professional.name }}{% if professional.license_number %} (CRP {{ professional.license_number }}){% endif %}
{% if professional.specialty %}**Especialidade:** {{ professional.specialty }}
{% endif %}**Paciente:** {{ patient.name }}
{% if patient.birth_date %}**Data de nascimento:** {{ patient.birth_date }}{% if patient.age %} ({{ patient.age }} anos){% endif %}
{% endif %}**Situação:** {{ patient.status }}
**Sessões realizadas:** {{ attended }}
**Emitido em:** {{ generated_on }}

## Registro de sessões
{% if sessions | length == 0 %}
Nenhuma sessão registrada.
{% endif %}{% for s in sessions %}
### {{ s.date }} às {{ s.time }}
**Situação:** {{ s.status }} | {{ s.duration_minutes }} min, {{ s.modality }}{% if s.cancellation_reason %}
**Motivo do cancelamento:** {{ s.cancellation_reason }}{% endif %}
{% if s.evolution %}
{{ s.evolution }}
{% endif %}{% endfor %}
---
Documento sigiloso. Uso restrito ao profissional responsável.
"#;

/// Render a Tera template with any serializable context.
pub fn render_template<T: Serialize>(
    template_name: &str,
    template_content: &str,
    data: &T,
) -> Result<String, ExportError> {
    let mut tera = Tera::default();
    tera.add_raw_template(template_name, template_content)
        .map_err(|e| ExportError::TemplateParse(e.to_string()))?;

    let value = serde_json::to_value(data)?;
    let context =
        Context::from_value(value).map_err(|e| ExportError::TemplateRender(e.to_string()))?;

    Ok(tera.render(template_name, &context)?)
}

pub fn render_clinical_record(record: &ClinicalRecord) -> Result<String, ExportError> {
    render_template("clinical_record.md", CLINICAL_RECORD_TEMPLATE, record)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Greeting {
        name: &'static str,
    }

    #[test]
    fn markdown_templates_are_not_html_escaped() {
        let out = render_template("g.md", "Olá, {{ name }}!", &Greeting { name: "<Ana & Bia>" }).unwrap();
        assert_eq!(out, "Olá, <Ana & Bia>!");
    }

    #[test]
    fn broken_template_is_a_parse_error() {
        let err = render_template("bad.md", "{% if %}", &Greeting { name: "x" }).unwrap_err();
        assert!(matches!(err, ExportError::TemplateParse(_)));
    }
}
