//! System prompts for the detection and interview calls.

use contract_types::{CollectedValues, VariableCatalog};

pub const ANALYZE_TEMPERATURE: f32 = 0.1;
pub const CHAT_TEMPERATURE: f32 = 0.3;

pub const ANALYZE_SYSTEM_PROMPT: &str = r#"Eres un experto legal argentino. Identifica variables en contratos de alquiler.

BUSCA: Locador, Locatario, Garante, Fiador, DNI, CUIT, Domicilios, Montos, Fechas.
REGLA: El "placeholder_text" debe ser el fragmento EXACTO del contrato (ej: ".........." o "DNI N° .....").
IMPORTANTE: Revisa el FINAL del contrato para los GARANTES.

Responde ÚNICAMENTE con este formato JSON:
{
  "variables": [
    {"key": "dniGarante", "label": "DNI del Garante", "placeholder_text": "D.N.I. ....", "type": "dni"}
  ],
  "analysis_notes": "Análisis rápido"
}"#;

const CHAT_INSTRUCTIONS: &str = r#"INSTRUCCIONES:
1. NO des por terminada la entrevista hasta que TODAS las variables tengan un valor.
2. Haz UNA pregunta clara a la vez.
3. Si el usuario da un dato que parece ser para otra variable, extráelo igual.
4. Si detectas un error de formato (ej: un DNI de 3 números), pide corregirlo amablemente.
5. NO te saltes a los Garantes/Fiadores si están en la lista.

Responde con JSON válido:
{
  "reply": "Tu mensaje al usuario",
  "extracted_data": {"key_de_la_variable": "valor_extraido"},
  "is_complete": false,
  "next_variable_key": "key_de_la_siguiente"
}"#;

/// Opening turn sent when the conversation has no messages yet.
pub const CHAT_OPENING_MESSAGE: &str = "Comencemos.";

pub fn analyze_user_message(contract_text: &str) -> String {
    format!("Analiza este contrato completo:\n\n{}", contract_text)
}

/// Interview prompt carrying the full catalog and the values gathered so far.
pub fn chat_system_prompt(catalog: &VariableCatalog, collected: &CollectedValues) -> String {
    let variables = serde_json::to_string_pretty(catalog).unwrap_or_else(|_| "[]".to_string());
    let data = serde_json::to_string_pretty(collected).unwrap_or_else(|_| "{}".to_string());

    format!(
        "Eres AsistenteContrato, un asistente legal formal para completar contratos de alquiler en Argentina.\n\
         Tu único objetivo es preguntarle al usuario CADA UNA de las variables pendientes.\n\n\
         LISTA DE VARIABLES (TODAS DEBEN SER COMPLETADAS):\n{}\n\n\
         DATOS ACTUALES:\n{}\n\n{}",
        variables, data, CHAT_INSTRUCTIONS
    )
}

pub const CONVERT_TEMPERATURE: f32 = 0.1;

const CONVERT_INSTRUCTIONS: &str = r#"Tu tarea: reemplazar TODOS los datos específicos por marcadores {{NOMBRE_EN_MAYUSCULAS}}.

VARIABLES TÍPICAS:
- Nombres: {{NOMBRE_LOCADOR}}, {{NOMBRE_LOCATARIO}}
- DNI: {{DNI_LOCADOR}}, {{DNI_LOCATARIO}}
- Domicilios: {{DOMICILIO_LOCADOR}}, {{DOMICILIO_LOCATARIO}}, {{DIRECCION_INMUEBLE}}
- Lugar: {{CIUDAD}}, {{PROVINCIA}}
- Fechas: {{FECHA_INICIO}}, {{DIA_FIRMA}}, {{MES_FIRMA}}, {{ANIO_FIRMA}}
- Plazo: {{DURACION_MESES}}, {{FECHA_VENCIMIENTO}}
- Montos: {{MONTO_ALQUILER_NUMEROS}}, {{MONTO_ALQUILER_LETRAS}}, {{MONTO_DEPOSITO}}
- Estado civil y nacionalidad: {{ESTADO_CIVIL_LOCADOR}}, {{ESTADO_CIVIL_LOCATARIO}}, {{NACIONALIDAD_LOCATARIO}}
- Garantes: {{NOMBRE_GARANTE}}, {{DNI_GARANTE}}, {{DOMICILIO_GARANTE}}
- Local comercial: {{RUBRO_COMERCIAL}}, {{SUPERFICIE_M2}}, {{CONDICION_AFIP}}

REGLAS:
1. Mantén el texto EXACTAMENTE igual, solo reemplaza los datos.
2. NO resumas ni omitas cláusulas.
3. Si un mismo dato aparece varias veces, usa el mismo marcador.
4. Devuelve ÚNICAMENTE el texto con marcadores, sin comentarios."#;

/// System prompt for turning a filled contract into a template.
pub fn convert_system_prompt(context: &str) -> String {
    format!(
        "Eres un experto en contratos argentinos. Vas a recibir un {}.\n\n{}",
        context, CONVERT_INSTRUCTIONS
    )
}

/// User turn for one chunk of the contract; chunk numbers start at 1.
pub fn convert_user_message(chunk: &str, number: usize, total: usize) -> String {
    if total <= 1 {
        format!("Aqui esta el contrato:\n\n{}", chunk)
    } else {
        format!("PARTE {}/{}:\n\n{}", number, total, chunk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contract_types::VariableDescriptor;

    #[test]
    fn test_chat_prompt_embeds_catalog_and_data() {
        let catalog: VariableCatalog =
            vec![VariableDescriptor::new("dniLocador", "DNI N° .....")].into();
        let collected: CollectedValues = [("dniLocador", "12345678")].into_iter().collect();

        let prompt = chat_system_prompt(&catalog, &collected);

        assert!(prompt.contains("\"key\": \"dniLocador\""));
        assert!(prompt.contains("\"dniLocador\": \"12345678\""));
        assert!(prompt.ends_with(CHAT_INSTRUCTIONS));
    }

    #[test]
    fn test_analyze_message_includes_text() {
        assert!(analyze_user_message("CONTRATO").ends_with("\n\nCONTRATO"));
    }

    #[test]
    fn test_convert_message_numbers_parts_only_when_split() {
        assert_eq!(
            convert_user_message("texto", 1, 1),
            "Aqui esta el contrato:\n\ntexto"
        );
        assert_eq!(convert_user_message("texto", 2, 3), "PARTE 2/3:\n\ntexto");
    }

    #[test]
    fn test_convert_prompt_names_contract_kind() {
        let prompt = convert_system_prompt("contrato de alquiler de local comercial");
        assert!(prompt.contains("Vas a recibir un contrato de alquiler de local comercial."));
        assert!(prompt.ends_with(CONVERT_INSTRUCTIONS));
    }
}
