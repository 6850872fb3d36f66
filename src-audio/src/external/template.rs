//! Command template mini-language
//!
//! A template is a command line containing brace-delimited placeholders:
//!
//! | placeholder            | value                         |
//! |------------------------|-------------------------------|
//! | `{host}`               | host executable               |
//! | `{input}` / `{in}`     | audio file handed to the host |
//! | `{output}` / `{out}`   | file the host must produce    |
//! | `{plugin}` / `{vst}`   | plugin path (optional)        |
//! | `{preset}`             | preset path (optional)        |
//!
//! Substitution is a single left-to-right pass, so text coming from a
//! substituted value is never expanded again. Anything else in braces is
//! copied verbatim. Values are quoted for the target platform; an absent
//! plugin or preset becomes an empty string.

use super::errors::{DispatchError, DispatchResult};
use std::path::Path;

const INPUT_PLACEHOLDERS: [&str; 2] = ["{input}", "{in}"];
const OUTPUT_PLACEHOLDERS: [&str; 2] = ["{output}", "{out}"];

/// Quoting convention of the target command interpreter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    Posix,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Posix
        }
    }
}

fn is_shell_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || "@%+=:,./_-".contains(c)
}

/// Quote a value so the platform's interpreter reads it as one word
///
/// Windows wraps the value in double quotes. POSIX leaves words made of
/// `[A-Za-z0-9@%+=:,./_-]` bare and otherwise single-quotes them, writing
/// an embedded `'` as `'"'"'`.
pub fn quote_path(value: &str, platform: Platform) -> String {
    match platform {
        Platform::Windows => format!("\"{}\"", value),
        Platform::Posix => {
            if value.is_empty() {
                "''".to_string()
            } else if value.chars().all(is_shell_safe) {
                value.to_string()
            } else {
                format!("'{}'", value.replace('\'', "'\"'\"'"))
            }
        }
    }
}

/// Values substituted into a template
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaceholderValues {
    pub host: String,
    pub input: String,
    pub output: String,
    pub plugin: Option<String>,
    pub preset: Option<String>,
}

fn path_text(path: &Path, what: &str) -> DispatchResult<String> {
    path.to_str()
        .map(str::to_string)
        .ok_or_else(|| DispatchError::Template(format!("{} path is not valid UTF-8: {}", what, path.display())))
}

impl PlaceholderValues {
    /// Build from paths; non UTF-8 paths are rejected
    pub fn from_paths(
        host: &Path,
        input: &Path,
        output: &Path,
        plugin: Option<&Path>,
        preset: Option<&Path>,
    ) -> DispatchResult<Self> {
        Ok(Self {
            host: path_text(host, "host")?,
            input: path_text(input, "input")?,
            output: path_text(output, "output")?,
            plugin: plugin.map(|p| path_text(p, "plugin")).transpose()?,
            preset: preset.map(|p| path_text(p, "preset")).transpose()?,
        })
    }

    fn quoted(&self, placeholder: &str, platform: Platform) -> Option<String> {
        let optional = |value: &Option<String>| match value.as_deref() {
            Some(v) if !v.is_empty() => quote_path(v, platform),
            _ => String::new(),
        };
        match placeholder {
            "{host}" => Some(quote_path(&self.host, platform)),
            "{input}" | "{in}" => Some(quote_path(&self.input, platform)),
            "{output}" | "{out}" => Some(quote_path(&self.output, platform)),
            "{plugin}" | "{vst}" => Some(optional(&self.plugin)),
            "{preset}" => Some(optional(&self.preset)),
            _ => None,
        }
    }
}

/// A template checked for the mandatory placeholders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTemplate {
    text: String,
}

impl CommandTemplate {
    /// Validate a template
    ///
    /// # Errors
    /// `Template` when the text is blank or lacks an input or an output
    /// placeholder.
    pub fn parse(text: &str) -> DispatchResult<Self> {
        if text.trim().is_empty() {
            return Err(DispatchError::Template("template is empty".to_string()));
        }
        if !INPUT_PLACEHOLDERS.iter().any(|p| text.contains(p)) {
            return Err(DispatchError::Template(
                "template has no {input} or {in} placeholder".to_string(),
            ));
        }
        if !OUTPUT_PLACEHOLDERS.iter().any(|p| text.contains(p)) {
            return Err(DispatchError::Template(
                "template has no {output} or {out} placeholder".to_string(),
            ));
        }
        Ok(Self {
            text: text.to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Substitute placeholders in one pass
    pub fn render(&self, values: &PlaceholderValues, platform: Platform) -> String {
        let mut out = String::with_capacity(self.text.len() + 64);
        let mut rest = self.text.as_str();
        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let candidate = &rest[open..];
            let replaced = candidate.find('}').and_then(|close| {
                let placeholder = &candidate[..=close];
                values
                    .quoted(placeholder, platform)
                    .map(|value| (value, placeholder.len()))
            });
            match replaced {
                Some((value, consumed)) => {
                    out.push_str(&value);
                    rest = &candidate[consumed..];
                }
                None => {
                    out.push('{');
                    rest = &candidate[1..];
                }
            }
        }
        out.push_str(rest);
        out
    }
}

/// Validate `template` and render it for `platform`
pub fn build_command_for(
    template: &str,
    values: &PlaceholderValues,
    platform: Platform,
) -> DispatchResult<String> {
    Ok(CommandTemplate::parse(template)?.render(values, platform))
}

/// Validate `template` and render it for the running platform
pub fn build_command(template: &str, values: &PlaceholderValues) -> DispatchResult<String> {
    build_command_for(template, values, Platform::current())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values() -> PlaceholderValues {
        PlaceholderValues {
            host: "/usr/bin/carla".to_string(),
            input: "/tmp/in put.wav".to_string(),
            output: "/tmp/out.wav".to_string(),
            plugin: None,
            preset: None,
        }
    }

    #[test]
    fn test_posix_quoting() {
        assert_eq!(quote_path("/a/b-c_d.wav", Platform::Posix), "/a/b-c_d.wav");
        assert_eq!(quote_path("", Platform::Posix), "''");
        assert_eq!(quote_path("a b", Platform::Posix), "'a b'");
        assert_eq!(quote_path("it's", Platform::Posix), "'it'\"'\"'s'");
        assert_eq!(quote_path("$HOME", Platform::Posix), "'$HOME'");
        assert_eq!(quote_path("café", Platform::Posix), "'café'");
    }

    #[test]
    fn test_windows_quoting() {
        assert_eq!(
            quote_path(r"C:\Program Files\x.exe", Platform::Windows),
            "\"C:\\Program Files\\x.exe\""
        );
        assert_eq!(quote_path("", Platform::Windows), "\"\"");
    }

    #[test]
    fn test_basic_posix_build() {
        let cmd = build_command_for("{host} {input} {output}", &values(), Platform::Posix).unwrap();
        assert_eq!(cmd, "/usr/bin/carla '/tmp/in put.wav' /tmp/out.wav");
    }

    #[test]
    fn test_aliases_and_optional_values() {
        let cmd = build_command_for(
            "{host} --load {plugin} --preset {preset} {in} {out}",
            &values(),
            Platform::Posix,
        )
        .unwrap();
        assert_eq!(
            cmd,
            "/usr/bin/carla --load  --preset  '/tmp/in put.wav' /tmp/out.wav"
        );

        let mut with_plugin = values();
        with_plugin.plugin = Some("/vst/My EQ.so".to_string());
        let cmd = build_command_for("{host} {plugin} {in} {out}", &with_plugin, Platform::Windows)
            .unwrap();
        assert_eq!(
            cmd,
            "\"/usr/bin/carla\" \"/vst/My EQ.so\" \"/tmp/in put.wav\" \"/tmp/out.wav\""
        );
    }

    #[test]
    fn test_vst_is_plugin_alias() {
        let mut with_plugin = values();
        with_plugin.plugin = Some("/vst/eq.so".to_string());
        let cmd = build_command_for("{host} --load {vst} {in} {out}", &with_plugin, Platform::Posix)
            .unwrap();
        assert_eq!(
            cmd,
            "/usr/bin/carla --load /vst/eq.so '/tmp/in put.wav' /tmp/out.wav"
        );

        let cmd = build_command_for("{host} --load {vst} {in} {out}", &values(), Platform::Posix)
            .unwrap();
        assert_eq!(cmd, "/usr/bin/carla --load  '/tmp/in put.wav' /tmp/out.wav");
    }

    #[test]
    fn test_unknown_placeholders_kept_verbatim() {
        let cmd = build_command_for("{host} {fx} {input} -o={output} {", &values(), Platform::Posix)
            .unwrap();
        assert_eq!(
            cmd,
            "/usr/bin/carla {fx} '/tmp/in put.wav' -o=/tmp/out.wav {"
        );
    }

    #[test]
    fn test_substituted_text_not_reexpanded() {
        let mut tricky = values();
        tricky.input = "{output}".to_string();
        let cmd = build_command_for("{input} {output}", &tricky, Platform::Posix).unwrap();
        assert_eq!(cmd, "'{output}' /tmp/out.wav");
    }

    #[test]
    fn test_missing_placeholders_rejected() {
        for bad in ["", "   ", "{host} {input}", "{host} {output}", "{host} {IN} {OUT}"] {
            assert!(
                matches!(CommandTemplate::parse(bad), Err(DispatchError::Template(_))),
                "{:?}",
                bad
            );
        }
        assert!(CommandTemplate::parse("{in}{out}").is_ok());
    }

    #[test]
    fn test_from_paths() {
        let v = PlaceholderValues::from_paths(
            Path::new("/bin/host"),
            Path::new("/a.wav"),
            Path::new("/b.wav"),
            Some(Path::new("/p.so")),
            None,
        )
        .unwrap();
        assert_eq!(v.plugin.as_deref(), Some("/p.so"));
        assert!(v.preset.is_none());
    }
}
