use bridge_types::BridgeError;

/// One `config { ... }` block of the served-model document (§6). `extra`
/// preserves any field this parser doesn't interpret, verbatim, so a
/// round-trip through an untouched entry doesn't lose information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServedModelEntry {
    pub name: String,
    pub base_path: String,
    pub platform: String,
    pub extra: Vec<String>,
}

impl ServedModelEntry {
    pub fn new(name: impl Into<String>, base_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_path: base_path.into(),
            platform: "tensorflow".to_string(),
            extra: Vec::new(),
        }
    }
}

/// The served-model configuration document: a `model_config_list { config
/// {...} config {...} }` text-protocol value (§6). Only the subset of
/// fields the bridge cares about is interpreted; anything else inside a
/// `config` block is carried forward in [`ServedModelEntry::extra`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServingConfigDocument {
    pub entries: Vec<ServedModelEntry>,
}

impl ServingConfigDocument {
    /// An empty document parses to an empty entry list (§4.6 readiness
    /// edge case: "a sink that parses as an empty served-model list is
    /// ready").
    pub fn parse(text: &str) -> Result<Self, BridgeError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(Self::default());
        }

        let list_open = trimmed
            .find("model_config_list")
            .and_then(|pos| trimmed[pos..].find('{').map(|b| pos + b))
            .ok_or_else(|| BridgeError::state("serving config is not round-trippable: missing model_config_list"))?;
        let list_body = extract_block(trimmed, list_open)?;

        let mut entries = Vec::new();
        let mut cursor = 0;
        while let Some(rel) = list_body[cursor..].find("config") {
            let config_start = cursor + rel;
            let Some(brace_rel) = list_body[config_start..].find('{') else {
                break;
            };
            let brace_pos = config_start + brace_rel;
            let body = extract_block(list_body, brace_pos)?;
            entries.push(parse_entry(body)?);
            cursor = brace_pos + body.len() + 2; // past the matched '{' ... '}'
        }

        Ok(Self { entries })
    }

    /// Emits a document a downstream TensorFlow-Serving-style server can
    /// read back. Field order within a regenerated entry is fixed
    /// (name, base_path, model_platform, then preserved extras); the
    /// "ignoring unknown-field ordering" allowance in §8 covers exactly
    /// this.
    pub fn serialize(&self) -> String {
        let mut out = String::from("model_config_list {\n");
        for entry in &self.entries {
            out.push_str("  config {\n");
            out.push_str(&format!("    name: \"{}\"\n", entry.name));
            out.push_str(&format!("    base_path: \"{}\"\n", entry.base_path));
            out.push_str(&format!("    model_platform: \"{}\"\n", entry.platform));
            for line in &entry.extra {
                out.push_str("    ");
                out.push_str(line);
                out.push('\n');
            }
            out.push_str("  }\n");
        }
        out.push_str("}\n");
        out
    }
}

/// Given the index of an opening `{`, returns the text strictly between it
/// and its matching `}`, honoring nesting.
fn extract_block(text: &str, open_brace: usize) -> Result<&str, BridgeError> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut i = open_brace;
    while i < bytes.len() {
        match bytes[i] {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(&text[open_brace + 1..i]);
                }
            }
            _ => {}
        }
        i += 1;
    }
    Err(BridgeError::state("serving config is not round-trippable: unbalanced braces"))
}

fn parse_entry(body: &str) -> Result<ServedModelEntry, BridgeError> {
    let mut name = None;
    let mut base_path = None;
    let mut platform = None;
    let mut extra = Vec::new();

    for raw_line in body.lines() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }
        let Some((key, value)) = line.split_once(':') else {
            extra.push(line.to_string());
            continue;
        };
        let key = key.trim();
        let value = value.trim().trim_matches('"').to_string();
        match key {
            "name" => name = Some(value),
            "base_path" => base_path = Some(value),
            "model_platform" => platform = Some(value),
            _ => extra.push(line.to_string()),
        }
    }

    Ok(ServedModelEntry {
        name: name.ok_or_else(|| BridgeError::state("serving config entry missing name"))?,
        base_path: base_path.ok_or_else(|| BridgeError::state("serving config entry missing base_path"))?,
        platform: platform.unwrap_or_else(|| "tensorflow".to_string()),
        extra,
    })
}
