//! Text commands typed into the shell.
//!
//! One command per line: a keyword, then its arguments. Values that may hold
//! spaces (names, notes, search terms) take the rest of the line verbatim.

use thiserror::Error;

use crate::Route;

pub const HELP: &str = "\
Comandos:
  go <caminho>              abrir uma rota (/dashboard, /pacientes, /cadastrar-paciente, /paciente/<id>)
  login <email> <senha>     entrar
  logout                    sair
  set <campo> <valor>       preencher um campo (email, senha, nome, nascimento, observacoes, data, descricao)
  search <termo>            filtrar a lista de pacientes
  open <n>                  abrir o n-ésimo paciente da lista
  submit                    enviar o formulário aberto
  evolucao                  abrir o diálogo de nova evolução
  cancel                    fechar o diálogo
  reload                    recarregar a tela
  help                      mostrar esta ajuda
  quit                      encerrar";

/// An editable form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Email,
    Password,
    Name,
    BirthDate,
    Notes,
    /// Evolution date.
    Date,
    /// Evolution text.
    Description,
}

impl Field {
    fn parse(raw: &str) -> Option<Self> {
        let field = match raw.to_lowercase().as_str() {
            "email" => Field::Email,
            "senha" | "password" => Field::Password,
            "nome" | "name" => Field::Name,
            "nascimento" | "data_nascimento" | "birth" => Field::BirthDate,
            "observacoes" | "observações" | "notes" => Field::Notes,
            "data" | "date" => Field::Date,
            "descricao" | "descrição" | "description" => Field::Description,
            _ => return None,
        };
        Some(field)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Go(Route),
    Login { email: String, password: String },
    Logout,
    Set(Field, String),
    Search(String),
    /// 1-based position in the visible patient list.
    Open(usize),
    Submit,
    NewEvolution,
    Cancel,
    Reload,
    Help,
    Quit,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("nenhum comando informado")]
    Empty,

    #[error("comando desconhecido: {0} (digite help)")]
    Unknown(String),

    #[error("{command}: falta {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },

    #[error("campo desconhecido: {0}")]
    UnknownField(String),

    #[error("número inválido: {0}")]
    InvalidNumber(String),
}

impl CommandError {
    fn missing(command: &'static str, argument: &'static str) -> Self {
        Self::MissingArgument { command, argument }
    }
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let line = line.trim_start().trim_end_matches(['\r', '\n']);
        // `raw` keeps trailing spaces for password values.
        let (keyword, raw) = match line.split_once(char::is_whitespace) {
            Some((keyword, raw)) => (keyword.trim_end(), raw.trim_start()),
            None => (line.trim_end(), ""),
        };
        let rest = raw.trim_end();

        let command = match keyword.to_lowercase().as_str() {
            "" => return Err(CommandError::Empty),
            "go" | "ir" => {
                if rest.is_empty() {
                    return Err(CommandError::missing("go", "caminho"));
                }
                Command::Go(Route::parse(rest))
            }
            "login" | "entrar" => {
                let mut words = rest.split_whitespace();
                let email = words.next().ok_or(CommandError::missing("login", "email"))?;
                let password = words.next().ok_or(CommandError::missing("login", "senha"))?;
                Command::Login {
                    email: email.to_string(),
                    password: password.to_string(),
                }
            }
            "logout" | "sair" => Command::Logout,
            "set" => {
                let (name, value) = match raw.split_once(char::is_whitespace) {
                    Some((name, value)) => (name, value),
                    None => (rest, ""),
                };
                if name.is_empty() {
                    return Err(CommandError::missing("set", "campo"));
                }
                let field =
                    Field::parse(name).ok_or_else(|| CommandError::UnknownField(name.to_string()))?;
                let value = match field {
                    Field::Password => value,
                    _ => value.trim(),
                };
                Command::Set(field, value.to_string())
            }
            "search" | "buscar" => Command::Search(rest.to_string()),
            "open" | "abrir" => {
                if rest.is_empty() {
                    return Err(CommandError::missing("open", "número"));
                }
                let position = rest
                    .parse()
                    .map_err(|_| CommandError::InvalidNumber(rest.to_string()))?;
                Command::Open(position)
            }
            "submit" | "salvar" => Command::Submit,
            "evolucao" | "evolução" => Command::NewEvolution,
            "cancel" | "cancelar" => Command::Cancel,
            "reload" => Command::Reload,
            "help" | "ajuda" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_are_case_insensitive_and_have_portuguese_aliases() {
        assert_eq!(Command::parse("  QUIT "), Ok(Command::Quit));
        assert_eq!(Command::parse("sair"), Ok(Command::Logout));
        assert_eq!(Command::parse("ir /pacientes"), Ok(Command::Go(Route::Patients)));
    }

    #[test]
    fn free_text_values_keep_inner_spaces() {
        assert_eq!(
            Command::parse("set nome  Ana   Souza "),
            Ok(Command::Set(Field::Name, "Ana   Souza".to_string()))
        );
        assert_eq!(
            Command::parse("set observacoes"),
            Ok(Command::Set(Field::Notes, String::new()))
        );
        assert_eq!(
            Command::parse("search maria clara"),
            Ok(Command::Search("maria clara".to_string()))
        );
        assert_eq!(Command::parse("search"), Ok(Command::Search(String::new())));
    }

    #[test]
    fn password_values_are_kept_verbatim() {
        assert_eq!(
            Command::parse("set senha  com espaço  "),
            Ok(Command::Set(Field::Password, " com espaço  ".to_string()))
        );
        assert_eq!(
            Command::parse("set nome  Ana  "),
            Ok(Command::Set(Field::Name, "Ana".to_string()))
        );
    }

    #[test]
    fn login_takes_two_words() {
        assert_eq!(
            Command::parse("login ana@clinica.com segredo"),
            Ok(Command::Login {
                email: "ana@clinica.com".to_string(),
                password: "segredo".to_string(),
            })
        );
        assert_eq!(
            Command::parse("login ana@clinica.com"),
            Err(CommandError::missing("login", "senha"))
        );
    }

    #[test]
    fn bad_input_is_reported() {
        assert_eq!(Command::parse("   "), Err(CommandError::Empty));
        assert_eq!(
            Command::parse("dance"),
            Err(CommandError::Unknown("dance".to_string()))
        );
        assert_eq!(
            Command::parse("set idade 3"),
            Err(CommandError::UnknownField("idade".to_string()))
        );
        assert_eq!(
            Command::parse("open dois"),
            Err(CommandError::InvalidNumber("dois".to_string()))
        );
        assert_eq!(Command::parse("go"), Err(CommandError::missing("go", "caminho")));
    }

    #[test]
    fn unknown_paths_parse_as_unmatched() {
        assert_eq!(Command::parse("go /paciente/xyz"), Ok(Command::Go(Route::Unmatched)));
    }
}
