use std::sync::{Arc, RwLock};

use clinic_auth::{Credentials, SessionState};

use super::layout::{CLINIC_NAME, TAGLINE};
use super::{InFlight, SubmitError, read, write};

pub const CREDENTIALS_REQUIRED: &str = "Preencha email e senha";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub error: Option<String>,
}

pub struct LoginView {
    session: Arc<SessionState>,
    form: RwLock<LoginForm>,
    submitting: InFlight,
}

impl LoginView {
    pub fn new(session: Arc<SessionState>) -> Self {
        Self {
            session,
            form: RwLock::new(LoginForm::default()),
            submitting: InFlight::default(),
        }
    }

    pub fn form(&self) -> LoginForm {
        read(&self.form).clone()
    }

    pub fn set_email(&self, email: &str) {
        write(&self.form).email = email.to_string();
    }

    pub fn set_password(&self, password: &str) {
        write(&self.form).password = password.to_string();
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting.is_set()
    }

    /// Sign in with the typed credentials.
    ///
    /// Success only means the service accepted them; the session
    /// notification decides when the user counts as signed in.
    pub async fn submit(&self) -> Result<(), SubmitError> {
        let _guard = self.submitting.try_begin().ok_or(SubmitError::Busy)?;

        let credentials = {
            let mut form = write(&self.form);
            form.error = None;
            let email = form.email.trim().to_string();
            if email.is_empty() || form.password.is_empty() {
                form.error = Some(CREDENTIALS_REQUIRED.to_string());
                return Err(SubmitError::Invalid(CREDENTIALS_REQUIRED.to_string()));
            }
            Credentials::new(email, form.password.clone())
        };

        match self.session.sign_in(&credentials).await {
            Ok(()) => {
                write(&self.form).password.clear();
                Ok(())
            }
            Err(failure) => {
                write(&self.form).error = Some(failure.message.clone());
                Err(SubmitError::Failed(failure.message))
            }
        }
    }

    pub fn render(&self) -> String {
        let form = self.form();
        let mut out = format!("{CLINIC_NAME}\n{TAGLINE}\n\nEntrar\n");
        out.push_str(&format!("Email: {}\n", form.email));
        out.push_str(&format!("Senha: {}\n", "*".repeat(form.password.chars().count())));
        if let Some(error) = &form.error {
            out.push_str(&format!("! {error}\n"));
        }
        if self.is_submitting() {
            out.push_str("Entrando...\n");
        }
        out
    }
}
