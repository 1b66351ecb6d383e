//! Prompt Templates
//!
//! Static system prompts, the per-department specializations and the
//! builder that layers user instructions, memory and document context on top.

use serde::{Deserialize, Serialize};

/// Phrases that, when found in a first answer, mean the model lacked the
/// information and a web search should be attempted.
pub const WEB_SEARCH_TRIGGERS: [&str; 4] = [
    "no tengo información",
    "no dispongo de información",
    "no tengo acceso",
    "no sé sobre eso",
];

pub const USER_INSTRUCTIONS_HEADER: &str = "\n\n### Instrucciones Adicionales Usuario ###";
pub const USER_MEMORY_HEADER: &str = "\n\n### Memoria del Usuario ###";

pub const IMAGE_REPORT_PROMPT: &str = "Analiza la imagen, extrae su texto (OCR), y redacta un informe HTML profesional basado en ese texto. Sigue formato HTML y evita Markdown. Devuelve solo el HTML.";

pub const SEARCH_CHAT_FALLBACK_PROMPT: &str = "Eres un asistente IA profesional y experto.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Specialization {
    #[default]
    General,
    Legal,
    Comunicacion,
    Formacion,
    Informatica,
    Direccion,
    Innovacion,
    Contabilidad,
    Administracion,
}

impl Specialization {
    /// Case-insensitive; unknown values fall back to `General`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "legal" => Self::Legal,
            "comunicacion" => Self::Comunicacion,
            "formacion" => Self::Formacion,
            "informatica" => Self::Informatica,
            "direccion" => Self::Direccion,
            "innovacion" => Self::Innovacion,
            "contabilidad" => Self::Contabilidad,
            "administracion" => Self::Administracion,
            _ => Self::General,
        }
    }

    pub fn instruction(&self) -> &'static str {
        match self {
            Self::General => "Actúa generalista.",
            Self::Legal => "Enfoque legal y normativo.",
            Self::Comunicacion => "Rol comunicación y marketing.",
            Self::Formacion => "Especialista formación y pedagogía.",
            Self::Informatica => "Aspectos técnicos y sistemas.",
            Self::Direccion => "Perspectiva estratégica y gestión.",
            Self::Innovacion => "Enfoque novedad y digitalización.",
            Self::Contabilidad => "Experto contable y finanzas.",
            Self::Administracion => "Eficiencia procesos administrativos.",
        }
    }
}

pub fn consultation_base_prompt(org: &str) -> String {
    format!(
        "Eres el Asistente IA oficial de {org}. \
        Tu misión es ayudar a los distintos equipos internos de {org} con respuestas claras, precisas, y alineadas a sus objetivos estratégicos. \
        Si no tienes información directa sobre temas muy específicos o actuales, indícalo claramente y, si se te proporciona contexto web o de documentos de usuario, intégralo. \
        Cuando respondas con listas estructuradas o datos comparativos, utiliza siempre tablas en formato HTML (usa <table>, <thead>, <tbody>, <tr>, <th>, <td>). \
        Para listas simples, usa <ul> y <li>. Para enfatizar, usa <strong> o <em>. \
        Evita usar Markdown. Tu respuesta debe ser directamente HTML renderizable."
    )
}

pub fn analysis_base_prompt(org: &str) -> String {
    format!(
        "Eres el Asistente IA oficial de {org}, experto en redactar informes profesionales concisos y claros \
        a partir de contenido textual o visual de documentos (PDF, DOCX, imágenes). \
        Estructura siempre los informes con claridad, estilo formal y formato HTML limpio. \
        Usa encabezados (<h2>, <h3>), párrafos (<p>), listas (<ul>, <li>), y énfasis (<strong>, <em>) apropiadamente. \
        La respuesta debe ser únicamente el código HTML del informe, sin explicaciones previas o posteriores. \
        Adapta ligeramente el tono y enfoque según la especialización indicada y las instrucciones adicionales del usuario si existen."
    )
}

pub fn text_report_prompt(extracted_text: &str) -> String {
    format!(
        "Redacta un informe HTML profesional basado en texto:\n--- INICIO ---\n{extracted_text}\n--- FIN ---\n Sigue formato HTML, evita Markdown. Devuelve solo HTML."
    )
}

pub fn web_context_prompt(message: &str, web_results_html: &str) -> String {
    format!(
        "Consulta: {message}\nContexto web:\n{web_results_html}\n\nResponde consulta integrando contexto."
    )
}

pub fn seo_refinement_prompt(query: &str) -> String {
    format!(
        "Eres un experto en SEO. Reformula esta consulta para buscar noticias precisas en Google:\n\n{query}"
    )
}

pub fn web_context_system_prompt(context_blocks: &[String]) -> String {
    format!(
        "Eres un asistente IA profesional. A continuación, información relevante obtenida de la web:\n\n{}",
        context_blocks.join("\n---\n")
    )
}

/// True when the answer admits missing information.
pub fn needs_web_search(answer: &str) -> bool {
    let lower = answer.to_lowercase();
    WEB_SEARCH_TRIGGERS.iter().any(|phrase| lower.contains(phrase))
}

/// Assembles a system prompt; parts are joined with a newline and empty
/// optional sections are left out.
#[derive(Debug, Clone)]
pub struct SystemPromptBuilder {
    base: String,
    specialization: Specialization,
    user_instructions: Option<String>,
    user_memory: Option<String>,
    document_context: Option<String>,
}

impl SystemPromptBuilder {
    pub fn new(base: impl Into<String>, specialization: Specialization) -> Self {
        Self {
            base: base.into(),
            specialization,
            user_instructions: None,
            user_memory: None,
            document_context: None,
        }
    }

    pub fn user_instructions(mut self, instructions: Option<String>) -> Self {
        self.user_instructions = instructions.filter(|s| !s.trim().is_empty());
        self
    }

    pub fn user_memory(mut self, memory: Option<String>) -> Self {
        self.user_memory = memory.filter(|s| !s.trim().is_empty());
        self
    }

    pub fn document_context(mut self, context: Option<String>) -> Self {
        self.document_context = context.filter(|s| !s.trim().is_empty());
        self
    }

    pub fn build(self) -> String {
        let mut parts: Vec<String> = vec![self.base, self.specialization.instruction().to_string()];
        if let Some(instructions) = self.user_instructions {
            parts.push(USER_INSTRUCTIONS_HEADER.to_string());
            parts.push(instructions);
        }
        if let Some(memory) = self.user_memory {
            parts.push(USER_MEMORY_HEADER.to_string());
            parts.push(memory);
        }
        if let Some(context) = self.document_context {
            parts.push(context);
        }
        parts.join("\n")
    }
}
