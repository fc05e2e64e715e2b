use crate::kernel::services::ports::{ModeDescriptor, ModeResolver};
use crate::models::FileEntity;

/// Picks a mode from the file name's extension (or the whole name for
/// extension-less files such as `Makefile`).
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtensionModeResolver;

impl ModeResolver for ExtensionModeResolver {
    fn resolve_mode_for_file(&self, file: &FileEntity) -> Option<ModeDescriptor> {
        if file.is_directory {
            return None;
        }
        let name = file.name();
        let key = match name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => ext.to_ascii_lowercase(),
            _ => name.to_string(),
        };
        let (mode, mime) = match key.as_str() {
            "rs" => ("rust", "text/x-rustsrc"),
            "js" | "mjs" | "cjs" => ("javascript", "text/javascript"),
            "jsx" => ("jsx", "text/jsx"),
            "ts" | "mts" | "cts" => ("javascript", "application/typescript"),
            "tsx" => ("jsx", "text/typescript-jsx"),
            "json" => ("javascript", "application/json"),
            "py" | "pyi" => ("python", "text/x-python"),
            "go" => ("go", "text/x-go"),
            "c" | "h" => ("clike", "text/x-csrc"),
            "cc" | "cpp" | "cxx" | "hpp" | "hh" => ("clike", "text/x-c++src"),
            "java" => ("clike", "text/x-java"),
            "html" | "htm" => ("htmlmixed", "text/html"),
            "css" => ("css", "text/css"),
            "md" | "markdown" => ("markdown", "text/x-markdown"),
            "yml" | "yaml" => ("yaml", "text/x-yaml"),
            "toml" => ("toml", "text/x-toml"),
            "sh" | "bash" => ("shell", "text/x-sh"),
            "sql" => ("sql", "text/x-sql"),
            "xml" => ("xml", "application/xml"),
            "Makefile" | "makefile" => ("cmake", "text/x-cmake"),
            "Dockerfile" => ("dockerfile", "text/x-dockerfile"),
            _ => {
                return file.content_type.as_ref().map(|mime| ModeDescriptor {
                    mode: mime.clone(),
                    mime: mime.clone(),
                })
            }
        };
        Some(ModeDescriptor {
            mode: mode.to_string(),
            mime: mime.to_string(),
        })
    }
}
