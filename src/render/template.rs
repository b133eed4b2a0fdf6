//! File-backed template engine with `{{ var }}` interpolation.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;

use crate::render::{RenderError, TemplateEngine};

static VAR_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z0-9_]+)*)\s*\}\}")
        .expect("template variable regex is valid")
});

/// Templates keyed by file name, loaded once at startup.
#[derive(Debug, Clone, Default)]
pub struct FileTemplates {
    templates: HashMap<String, String>,
}

impl FileTemplates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every `*.{extension}` file directly inside `dir`.
    pub fn load_dir(dir: impl AsRef<Path>, extension: &str) -> Result<Self, RenderError> {
        let dir = dir.as_ref();
        let io_err = |source| RenderError::Io {
            path: dir.to_path_buf(),
            source,
        };

        let mut templates = HashMap::new();
        for entry in fs::read_dir(dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(extension) {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let source = fs::read_to_string(&path).map_err(|source| RenderError::Io {
                path: path.clone(),
                source,
            })?;
            templates.insert(name.to_string(), source);
        }

        tracing::info!(dir = %dir.display(), count = templates.len(), "Templates loaded");
        Ok(Self { templates })
    }

    /// Build from in-memory `(name, source)` pairs.
    pub fn from_sources<I, N, S>(sources: I) -> Self
    where
        I: IntoIterator<Item = (N, S)>,
        N: Into<String>,
        S: Into<String>,
    {
        Self {
            templates: sources
                .into_iter()
                .map(|(n, s)| (n.into(), s.into()))
                .collect(),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, source: impl Into<String>) {
        self.templates.insert(name.into(), source.into());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl TemplateEngine for FileTemplates {
    fn render(&self, name: &str, data: &Value) -> Result<Vec<u8>, RenderError> {
        let source = self
            .templates
            .get(name)
            .ok_or_else(|| RenderError::NotFound(name.to_string()))?;
        Ok(interpolate(source, data).into_bytes())
    }
}

fn interpolate(source: &str, data: &Value) -> String {
    VAR_REGEX
        .replace_all(source, |caps: &Captures| {
            lookup(data, &caps[1]).map(display).unwrap_or_default()
        })
        .into_owned()
}

fn lookup<'a>(data: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(data, |current, key| match current {
        Value::Object(map) => map.get(key),
        Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

fn display(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => escape_html(s),
        other => escape_html(&other.to_string()),
    }
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
