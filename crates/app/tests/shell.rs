//! End-to-end flows through the shell against the in-memory backend.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use serde_json::json;

use clinic_app::router::Outcome;
use clinic_app::shell::UNAVAILABLE;
use clinic_app::views::layout::LOADING;
use clinic_app::{Command, Field, Flow, Route, Shell};
use clinic_core::FixedClock;
use clinic_infra::{EVOLUTIONS_TABLE, InMemoryBackend, PATIENTS_TABLE};

const EMAIL: &str = "ana@clinica.com";
const PASSWORD: &str = "segredo";

fn backend() -> (Arc<FixedClock>, InMemoryBackend) {
    let clock = Arc::new(FixedClock::on(NaiveDate::from_ymd_opt(2024, 5, 10).unwrap()));
    let backend = InMemoryBackend::with_clock(clock.clone()).with_account(EMAIL, PASSWORD);
    (clock, backend)
}

fn shell(clock: Arc<FixedClock>, backend: Arc<InMemoryBackend>, start: &str) -> Shell {
    Shell::new(backend.clone(), backend, clock, Route::parse(start))
}

async fn signed_in_shell(start: &str) -> (Arc<InMemoryBackend>, Shell) {
    let (clock, backend) = backend();
    let backend = Arc::new(backend.with_session_for(EMAIL));
    let mut shell = shell(clock, backend.clone(), start);
    shell.start().await;
    (backend, shell)
}

#[tokio::test]
async fn signed_out_user_is_sent_to_login() {
    let (clock, backend) = backend();
    let mut shell = shell(clock, Arc::new(backend), "/dashboard");
    assert!(shell.render().contains(LOADING));

    shell.start().await;
    assert_eq!(shell.navigator().current(), Route::Login);
    assert_eq!(shell.outcome(), Some(Outcome::Render(Route::Login)));
    assert!(shell.render().contains("Entrar"));
}

#[tokio::test]
async fn signed_in_user_is_sent_away_from_login() {
    let (_, shell) = signed_in_shell("/login").await;
    assert_eq!(shell.navigator().current(), Route::Dashboard);
    let page = shell.render();
    assert!(page.contains("Bem-vinda ao Dashboard"));
    assert!(page.contains(EMAIL));
}

#[tokio::test]
async fn unknown_paths_land_on_the_dashboard() {
    let (_, shell) = signed_in_shell("/paciente/nao-existe").await;
    assert_eq!(shell.navigator().current(), Route::Dashboard);
}

#[tokio::test]
async fn identity_waits_for_the_session_notification() {
    let (clock, backend) = backend();
    let backend = Arc::new(backend);
    let mut shell = shell(clock, backend.clone(), "/login");
    shell.start().await;

    backend.hold_notifications();
    let flow = shell
        .execute(Command::Login {
            email: EMAIL.to_string(),
            password: PASSWORD.to_string(),
        })
        .await;
    assert_eq!(flow, Flow::Continue);
    assert_eq!(shell.session().user(), None);
    assert_eq!(shell.navigator().current(), Route::Login);

    let mut session = shell.session().watch();
    backend.release_notifications();
    session
        .wait_for(|snapshot| snapshot.is_authenticated())
        .await
        .unwrap();
    shell.refresh().await;

    assert_eq!(shell.navigator().current(), Route::Dashboard);
    assert_eq!(
        shell.session().user().map(|u| u.email().to_string()),
        Some(EMAIL.to_string())
    );
}

#[tokio::test]
async fn wrong_password_stays_on_login_with_the_message() {
    let (clock, backend) = backend();
    let mut shell = shell(clock, Arc::new(backend), "/login");
    shell.start().await;

    shell
        .execute(Command::Login {
            email: EMAIL.to_string(),
            password: "errada".to_string(),
        })
        .await;
    assert_eq!(shell.navigator().current(), Route::Login);
    assert!(shell.render().contains("Invalid login credentials"));
}

#[tokio::test]
async fn invalid_form_never_reaches_the_backend() {
    let (backend, mut shell) = signed_in_shell("/cadastrar-paciente").await;
    let calls = backend.data_calls();

    shell.execute(Command::Set(Field::Name, "  ".to_string())).await;
    shell.execute(Command::Set(Field::BirthDate, "2020-01-01".to_string())).await;
    shell.execute(Command::Submit).await;

    assert_eq!(backend.data_calls(), calls);
    assert!(shell.render().contains("Nome é obrigatório"));
}

#[tokio::test(start_paused = true)]
async fn created_patient_shows_up_in_the_list_after_the_redirect() {
    let (backend, mut shell) = signed_in_shell("/cadastrar-paciente").await;
    let mut routes = shell.navigator().subscribe();

    shell.execute(Command::Set(Field::Name, "Caio Lima".to_string())).await;
    shell.execute(Command::Set(Field::BirthDate, "2017-04-16".to_string())).await;
    shell.execute(Command::Submit).await;
    assert_eq!(backend.rows(PATIENTS_TABLE).len(), 1);
    assert!(shell.render().contains("Paciente Cadastrado com Sucesso!"));
    assert_eq!(shell.navigator().current(), Route::NewPatient);

    routes.borrow_and_update();
    tokio::time::sleep(Duration::from_secs(2)).await;
    routes.changed().await.unwrap();
    shell.refresh().await;

    assert_eq!(shell.outcome(), Some(Outcome::Render(Route::Patients)));
    assert!(shell.render().contains("1. Caio Lima (7 anos)"));
}

#[tokio::test(start_paused = true)]
async fn leaving_the_form_cancels_the_redirect() {
    let (_, mut shell) = signed_in_shell("/cadastrar-paciente").await;
    shell.execute(Command::Set(Field::Name, "Caio Lima".to_string())).await;
    shell.execute(Command::Set(Field::BirthDate, "2017-04-16".to_string())).await;
    shell.execute(Command::Submit).await;

    shell.execute(Command::Go(Route::Dashboard)).await;
    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(shell.navigator().current(), Route::Dashboard);
}

#[tokio::test(start_paused = true)]
async fn reopening_the_form_after_a_save_shows_a_blank_form() {
    let (_, mut shell) = signed_in_shell("/cadastrar-paciente").await;
    shell.execute(Command::Set(Field::Name, "Caio Lima".to_string())).await;
    shell.execute(Command::Set(Field::BirthDate, "2017-04-16".to_string())).await;
    shell.execute(Command::Submit).await;
    assert!(shell.render().contains("Paciente Cadastrado com Sucesso!"));

    shell.execute(Command::Go(Route::NewPatient)).await;
    tokio::time::sleep(Duration::from_secs(3)).await;

    assert_eq!(shell.navigator().current(), Route::NewPatient);
    assert!(!shell.navigator().has_pending());
    let page = shell.render();
    assert!(!page.contains("Paciente Cadastrado com Sucesso!"));
    assert!(page.contains("Cadastrar Novo Paciente"));
    assert!(page.contains("Nome Completo *: \n"));
}

#[tokio::test]
async fn open_a_patient_and_record_an_evolution() {
    let (backend, mut shell) = signed_in_shell("/pacientes").await;
    backend.seed(
        PATIENTS_TABLE,
        json!({ "nome": "Marina Souza", "data_nascimento": "2015-08-20" }),
    );
    shell.execute(Command::Reload).await;
    shell.execute(Command::Search("marina".to_string())).await;

    shell.execute(Command::Open(1)).await;
    assert!(matches!(
        shell.outcome(),
        Some(Outcome::Render(Route::PatientDetail(_)))
    ));
    assert!(shell.render().contains("Nenhuma evolução registrada"));

    shell.execute(Command::NewEvolution).await;
    shell
        .execute(Command::Set(Field::Description, "Sessão tranquila".to_string()))
        .await;
    shell.execute(Command::Submit).await;

    assert_eq!(backend.rows(EVOLUTIONS_TABLE).len(), 1);
    let page = shell.render();
    assert!(page.contains("Sessão tranquila"));
    assert!(page.contains("(1 registros)"));
    assert!(!page.contains("Nova Evolução"));
}

#[tokio::test]
async fn commands_outside_their_screen_are_reported() {
    let (_, mut shell) = signed_in_shell("/dashboard").await;
    shell.execute(Command::Search("ana".to_string())).await;
    assert_eq!(shell.notice(), Some(UNAVAILABLE));

    shell.execute(Command::Go(Route::Patients)).await;
    shell.execute(Command::Open(5)).await;
    assert_eq!(shell.notice(), Some("Nenhum paciente na posição 5"));
}

#[tokio::test]
async fn sign_out_returns_to_login() {
    let (_, mut shell) = signed_in_shell("/pacientes").await;
    shell.execute(Command::Logout).await;

    assert_eq!(shell.session().user(), None);
    assert_eq!(shell.navigator().current(), Route::Login);
    assert_eq!(shell.execute(Command::Quit).await, Flow::Quit);
    shell.shutdown();
}
