//! The application shell.
//!
//! Owns the session, the navigator and the mounted view. After anything that
//! may change the session or the route, [`Shell::refresh`] re-runs the guards
//! and mounts the view for wherever the user ends up.

use std::sync::Arc;

use clinic_auth::{AuthService, SessionState, SessionSubscription};
use clinic_core::Clock;
use clinic_infra::{DataService, Records};

use crate::commands::{Command, Field, HELP};
use crate::router::{Outcome, Route, resolve};
use crate::views::{
    DashboardView, LoginView, PatientDetailView, PatientFormView, PatientListView, SubmitError,
    layout,
};
use crate::Navigator;

pub const UNAVAILABLE: &str = "Comando indisponível nesta tela";
pub const BUSY: &str = "Aguarde a operação em andamento";

/// Whether the input loop keeps going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

enum Screen {
    Waiting,
    Login(LoginView),
    Dashboard(DashboardView),
    Patients(PatientListView),
    NewPatient(PatientFormView),
    PatientDetail(PatientDetailView),
}

pub struct Shell {
    session: Arc<SessionState>,
    subscription: Option<SessionSubscription>,
    records: Records,
    clock: Arc<dyn Clock>,
    navigator: Navigator,
    mounted: Option<Outcome>,
    screen: Screen,
    notice: Option<String>,
}

impl Shell {
    pub fn new(
        auth: Arc<dyn AuthService>,
        data: Arc<dyn DataService>,
        clock: Arc<dyn Clock>,
        start: Route,
    ) -> Self {
        Self {
            session: SessionState::new(auth),
            subscription: None,
            records: Records::new(data),
            clock,
            navigator: Navigator::new(start),
            mounted: None,
            screen: Screen::Waiting,
            notice: None,
        }
    }

    pub fn session(&self) -> &Arc<SessionState> {
        &self.session
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    /// Where the last refresh settled.
    pub fn outcome(&self) -> Option<Outcome> {
        self.mounted
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Show a one-off message under the current view.
    pub fn notify(&mut self, message: impl Into<String>) {
        self.notice = Some(message.into());
    }

    /// Subscribe to session changes, resolve the initial identity and mount the
    /// first view.
    pub async fn start(&mut self) {
        if self.subscription.is_none() {
            self.subscription = Some(self.session.start().await);
        }
        self.refresh().await;
    }

    /// Re-run the guards for the current route and remount if the result
    /// changed. Redirects replace the route in place.
    pub async fn refresh(&mut self) {
        let requested = self.navigator.current();
        let outcome = resolve(requested, &self.session.snapshot());
        if outcome.route() != requested {
            self.navigator.replace(outcome.route());
        }
        if self.mounted == Some(outcome) {
            return;
        }

        tracing::debug!(route = %outcome.route(), ?outcome, "mounting view");
        self.screen = self.mount(outcome);
        self.mounted = Some(outcome);
        self.load().await;
    }

    fn mount(&self, outcome: Outcome) -> Screen {
        let route = match outcome {
            Outcome::Wait(_) => return Screen::Waiting,
            Outcome::Render(route) => route,
        };
        match route {
            Route::Login => Screen::Login(LoginView::new(self.session.clone())),
            Route::Dashboard => Screen::Dashboard(DashboardView::new(
                self.records.patients.clone(),
                self.clock.clone(),
            )),
            Route::Patients => Screen::Patients(PatientListView::new(
                self.records.patients.clone(),
                self.clock.clone(),
            )),
            Route::NewPatient => Screen::NewPatient(PatientFormView::new(
                self.records.patients.clone(),
                self.clock.clone(),
                self.navigator.clone(),
            )),
            Route::PatientDetail(id) => Screen::PatientDetail(PatientDetailView::new(
                id,
                self.records.clone(),
                self.clock.clone(),
            )),
            Route::Root | Route::Unmatched => {
                tracing::warn!(%route, "guards rendered a redirect-only route");
                Screen::Waiting
            }
        }
    }

    async fn load(&self) {
        match &self.screen {
            Screen::Dashboard(view) => view.load().await,
            Screen::Patients(view) => view.load().await,
            Screen::PatientDetail(view) => view.load().await,
            Screen::Waiting | Screen::Login(_) | Screen::NewPatient(_) => {}
        }
    }

    pub fn render(&self) -> String {
        let mut out = match &self.screen {
            Screen::Waiting => layout::waiting(),
            Screen::Login(view) => view.render(),
            Screen::Dashboard(view) => self.framed(&view.render()),
            Screen::Patients(view) => self.framed(&view.render()),
            Screen::NewPatient(view) => self.framed(&view.render()),
            Screen::PatientDetail(view) => self.framed(&view.render()),
        };
        if let Some(notice) = &self.notice {
            out.push_str(&format!("\n» {notice}\n"));
        }
        out
    }

    fn framed(&self, body: &str) -> String {
        let email = self
            .session
            .user()
            .map(|user| user.email().to_string())
            .unwrap_or_default();
        let current = self
            .mounted
            .map(|outcome| outcome.route())
            .unwrap_or(Route::Root);
        layout::frame(&email, current, body)
    }

    /// Run one command to completion.
    pub async fn execute(&mut self, command: Command) -> Flow {
        self.notice = None;
        match command {
            Command::Quit => return Flow::Quit,
            Command::Help => self.notice = Some(HELP.to_string()),
            Command::Go(route) => {
                self.navigator.navigate(route);
                // Going to the screen already shown starts it afresh.
                self.mounted = None;
                self.refresh().await;
            }
            Command::Logout => self.sign_out().await,
            Command::Login { email, password } => {
                let Screen::Login(view) = &self.screen else {
                    return self.unavailable_flow();
                };
                view.set_email(&email);
                view.set_password(&password);
                self.submit().await;
            }
            Command::Set(field, value) => self.set(field, &value),
            Command::Search(term) => match &self.screen {
                Screen::Patients(view) => view.set_search(&term),
                _ => self.unavailable(),
            },
            Command::Open(position) => {
                let target = match &self.screen {
                    Screen::Patients(view) => Some(view.patient_at(position)),
                    _ => None,
                };
                match target {
                    Some(Some(id)) => {
                        self.navigator.navigate(Route::PatientDetail(id));
                        self.refresh().await;
                    }
                    Some(None) => {
                        self.notice = Some(format!("Nenhum paciente na posição {position}"));
                    }
                    None => self.unavailable(),
                }
            }
            Command::Submit => self.submit().await,
            Command::NewEvolution => match &self.screen {
                Screen::PatientDetail(view) if view.state().patient.is_some() => {
                    view.open_dialog()
                }
                _ => self.unavailable(),
            },
            Command::Cancel => match &self.screen {
                Screen::PatientDetail(view) => view.close_dialog(),
                _ => self.unavailable(),
            },
            Command::Reload => match &self.screen {
                Screen::Dashboard(_) | Screen::Patients(_) | Screen::PatientDetail(_) => {
                    self.load().await
                }
                _ => self.unavailable(),
            },
        }
        Flow::Continue
    }

    fn set(&mut self, field: Field, value: &str) {
        let result = match (&self.screen, field) {
            (Screen::Login(view), Field::Email) => {
                view.set_email(value);
                Ok(())
            }
            (Screen::Login(view), Field::Password) => {
                view.set_password(value);
                Ok(())
            }
            (Screen::NewPatient(view), Field::Name) => {
                view.set_name(value);
                Ok(())
            }
            (Screen::NewPatient(view), Field::BirthDate) => {
                view.set_birth_date(value);
                Ok(())
            }
            (Screen::NewPatient(view), Field::Notes) => {
                view.set_notes(value);
                Ok(())
            }
            (Screen::PatientDetail(view), Field::Date) => view.set_evolution_date(value),
            (Screen::PatientDetail(view), Field::Description) => {
                view.set_evolution_description(value);
                Ok(())
            }
            _ => return self.unavailable(),
        };
        if let Err(err) = result {
            self.notice = Some(err.to_string());
        }
    }

    /// Validation and backend failures are shown by the view itself.
    async fn submit(&mut self) {
        let result = match &self.screen {
            Screen::Login(view) => view.submit().await,
            Screen::NewPatient(view) => view.submit().await.map(|_| ()),
            Screen::PatientDetail(view) => view.submit_evolution().await.map(|_| ()),
            _ => return self.unavailable(),
        };
        if result == Err(SubmitError::Busy) {
            self.notice = Some(BUSY.to_string());
        }
        self.refresh().await;
    }

    async fn sign_out(&mut self) {
        if !self.session.is_authenticated() {
            return self.unavailable();
        }
        if let Err(failure) = self.session.sign_out().await {
            self.notice = Some(failure.message);
        }
        self.refresh().await;
    }

    fn unavailable(&mut self) {
        self.notice = Some(UNAVAILABLE.to_string());
    }

    fn unavailable_flow(&mut self) -> Flow {
        self.unavailable();
        Flow::Continue
    }

    /// Stop the session listener and any pending navigation.
    pub fn shutdown(&mut self) {
        self.navigator.cancel_pending();
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
    }
}
