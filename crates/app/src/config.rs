//! Startup configuration.
//!
//! Read once before anything else runs. A missing or placeholder backend
//! credential replaces the whole application with a configuration screen.

use thiserror::Error;

pub const URL_VAR: &str = "SUPABASE_URL";
pub const ANON_KEY_VAR: &str = "SUPABASE_ANON_KEY";
pub const START_PATH_VAR: &str = "CLINIC_START_PATH";

/// Example values shipped in `.env.example`.
const PLACEHOLDER_URL: &str = "https://your-project-id.supabase.co";
const PLACEHOLDER_KEY: &str = "your-anon-key-here";

const DEFAULT_START_PATH: &str = "/";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("{0} still holds the example placeholder")]
    Placeholder(&'static str),

    #[error("{var} must be an http(s) URL, got {value:?}")]
    InvalidUrl { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub supabase_url: String,
    pub anon_key: String,
    /// First route the shell opens.
    pub start_path: String,
}

impl AppConfig {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let supabase_url = required(&lookup, URL_VAR, PLACEHOLDER_URL)?;
        if !(supabase_url.starts_with("http://") || supabase_url.starts_with("https://")) {
            return Err(ConfigError::InvalidUrl {
                var: URL_VAR,
                value: supabase_url,
            });
        }
        let anon_key = required(&lookup, ANON_KEY_VAR, PLACEHOLDER_KEY)?;
        let start_path = lookup(START_PATH_VAR)
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| DEFAULT_START_PATH.to_string());

        Ok(Self {
            supabase_url,
            anon_key,
            start_path,
        })
    }
}

fn required(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    placeholder: &str,
) -> Result<String, ConfigError> {
    let value = lookup(var)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(var))?;
    if value == placeholder {
        return Err(ConfigError::Placeholder(var));
    }
    Ok(value)
}

/// Full-screen replacement for the application when configuration is unusable.
pub fn render_error(err: &ConfigError) -> String {
    format!(
        "CLINICA PITICOS\n\
         Sistema de Gestão de Pacientes\n\
         \n\
         Configuração do Supabase Necessária\n\
         Para usar a aplicação, você precisa configurar as credenciais do Supabase.\n\
         ({err})\n\
         \n\
         Passos para configurar:\n\
         1. Crie uma conta no Supabase (supabase.com)\n\
         2. Crie um novo projeto\n\
         3. Execute o script SQL fornecido\n\
         4. Defina {URL_VAR} e {ANON_KEY_VAR} no ambiente ou no arquivo .env\n\
         5. Reinicie a aplicação\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn reads_credentials_and_defaults_the_start_path() {
        let config = AppConfig::from_lookup(lookup(&[
            (URL_VAR, "https://abc.supabase.co"),
            (ANON_KEY_VAR, " key-123 "),
        ]))
        .unwrap();
        assert_eq!(config.supabase_url, "https://abc.supabase.co");
        assert_eq!(config.anon_key, "key-123");
        assert_eq!(config.start_path, "/");
    }

    #[test]
    fn start_path_is_optional() {
        let config = AppConfig::from_lookup(lookup(&[
            (URL_VAR, "http://localhost:54321"),
            (ANON_KEY_VAR, "k"),
            (START_PATH_VAR, "/pacientes"),
        ]))
        .unwrap();
        assert_eq!(config.start_path, "/pacientes");
    }

    #[test]
    fn missing_or_blank_values_are_rejected() {
        assert_eq!(
            AppConfig::from_lookup(lookup(&[(ANON_KEY_VAR, "k")])),
            Err(ConfigError::Missing(URL_VAR))
        );
        assert_eq!(
            AppConfig::from_lookup(lookup(&[
                (URL_VAR, "https://abc.supabase.co"),
                (ANON_KEY_VAR, "   "),
            ])),
            Err(ConfigError::Missing(ANON_KEY_VAR))
        );
    }

    #[test]
    fn placeholders_count_as_unconfigured() {
        assert_eq!(
            AppConfig::from_lookup(lookup(&[(URL_VAR, PLACEHOLDER_URL), (ANON_KEY_VAR, "k")])),
            Err(ConfigError::Placeholder(URL_VAR))
        );
        assert_eq!(
            AppConfig::from_lookup(lookup(&[
                (URL_VAR, "https://abc.supabase.co"),
                (ANON_KEY_VAR, PLACEHOLDER_KEY),
            ])),
            Err(ConfigError::Placeholder(ANON_KEY_VAR))
        );
    }

    #[test]
    fn url_needs_a_scheme() {
        let err = AppConfig::from_lookup(lookup(&[(URL_VAR, "abc.supabase.co"), (ANON_KEY_VAR, "k")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { .. }));
    }

    #[test]
    fn error_screen_names_the_problem() {
        let screen = render_error(&ConfigError::Missing(URL_VAR));
        assert!(screen.contains("Configuração do Supabase Necessária"));
        assert!(screen.contains("SUPABASE_URL is not set"));
    }
}
