//! Local-first screen flows
//!
//! End-to-end scenarios across storage, session and controllers, run against
//! an on-disk store so state survives reopening.

use app_core::elearning::{seed_modules, ElearningController, LearningModule};
use app_core::events::{seed_events, Event, EventsController};
use app_core::forum::{seed_threads, ForumController, NewThread, Thread};
use app_core::programs::{seed_programs, Program, ProgramsController};
use app_core::services::{seed_services, ServicesController};
use app_core::submissions::{fields, FormType, SubmissionsController};
use app_core::{CoreError, Notice};
use app_state::{SessionContext, SessionUser};
use i18n::Translator;
use std::sync::Arc;
use storage::{keys, KvConfig, KvStore, LocalStore};
use tempfile::TempDir;

fn open_kv(dir: &TempDir) -> Arc<KvStore> {
    let path = dir.path().join("sapa.db");
    let config = KvConfig::new(path.to_string_lossy()).flush_every_ms(None);
    Arc::new(KvStore::new(config).unwrap())
}

fn open_store(dir: &TempDir) -> Arc<dyn LocalStore> {
    open_kv(dir)
}

fn siti() -> SessionUser {
    SessionUser {
        id: "u-siti".to_string(),
        name: "Siti Aminah".to_string(),
        email: "siti@example.com".to_string(),
        phone: "081234567890".to_string(),
        created_at: "2024-05-01T08:00:00Z".parse().unwrap(),
    }
}

async fn signed_in(store: &Arc<dyn LocalStore>) -> Arc<SessionContext> {
    let session = Arc::new(SessionContext::restore(Arc::clone(store)).await);
    session.sign_in(siti()).await.unwrap();
    session
}

#[tokio::test]
async fn test_fresh_store_shows_seed_data_on_every_screen() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    let session = Arc::new(SessionContext::restore(Arc::clone(&store)).await);

    let events: Vec<Event> = EventsController::new(Arc::clone(&store), Arc::clone(&session))
        .load()
        .await
        .into_iter()
        .map(|view| view.event)
        .collect();
    assert_eq!(events, seed_events());

    assert_eq!(ServicesController::new(Arc::clone(&store)).list(), seed_services());

    let threads: Vec<Thread> = ForumController::new(Arc::clone(&store), Arc::clone(&session))
        .load()
        .await
        .into_iter()
        .map(|view| view.thread)
        .collect();
    assert_eq!(threads, seed_threads().into_iter().map(|(_, t)| t).collect::<Vec<_>>());

    let modules: Vec<LearningModule> = ElearningController::new(Arc::clone(&store))
        .load()
        .await
        .into_iter()
        .map(|view| view.module)
        .collect();
    assert_eq!(modules, seed_modules().into_iter().map(|(_, m)| m).collect::<Vec<_>>());

    let programs: Vec<Program> = ProgramsController::new(Arc::clone(&store))
        .load()
        .await
        .into_iter()
        .map(|view| view.program)
        .collect();
    assert_eq!(programs, seed_programs().into_iter().map(|(_, p)| p).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_toggles_are_their_own_inverse() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    let session = Arc::new(SessionContext::restore(Arc::clone(&store)).await);

    let forum = ForumController::new(Arc::clone(&store), Arc::clone(&session));
    let before = forum.load().await;
    forum.toggle_like("1").await.unwrap();
    forum.toggle_like("1").await.unwrap();
    assert_eq!(forum.load().await, before);

    let elearning = ElearningController::new(Arc::clone(&store));
    let before = elearning.load().await;
    elearning.toggle_enrollment("3").await.unwrap();
    elearning.toggle_enrollment("3").await.unwrap();
    assert_eq!(elearning.load().await, before);

    let programs = ProgramsController::new(Arc::clone(&store));
    let before = programs.load().await;
    programs.toggle_bookmark("4").await.unwrap();
    programs.toggle_bookmark("4").await.unwrap();
    assert_eq!(programs.load().await, before);
}

#[tokio::test]
async fn test_blank_required_field_stores_nothing() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    let submissions = SubmissionsController::new(Arc::clone(&store));

    let result = submissions
        .submit(
            FormType::Perizinan,
            fields([
                ("ownerName", "Siti Aminah"),
                ("nik", ""),
                ("businessName", "Keripik Siti"),
                ("businessAddress", "Jl. Melati 5, Bogor"),
                ("businessType", "Makanan ringan"),
                ("kbli", "10794"),
            ]),
        )
        .await;

    let error = result.unwrap_err();
    assert!(matches!(error, CoreError::Validation { ref field, .. } if field == "nik"));
    assert_eq!(Notice::from_error(&Translator::default(), &error).message, "NIK wajib diisi.");

    assert!(submissions.list(FormType::Perizinan).await.is_empty());
    assert!(store.get_item(&keys::submissions("perizinan")).await.unwrap().is_none());
}

#[tokio::test]
async fn test_event_registration_takes_one_slot_once() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    let events = EventsController::new(Arc::clone(&store), signed_in(&store).await);

    let initial = events.load().await.into_iter().find(|v| v.event.id == "2").unwrap();
    assert_eq!(initial.slots_left, 12);

    let registered = events.register("2").await.unwrap();
    assert_eq!(registered.slots_left, 11);
    assert!(registered.is_registered);

    let again = events.register("2").await;
    assert!(matches!(again, Err(CoreError::AlreadyRegistered)));

    let view = events.load().await.into_iter().find(|v| v.event.id == "2").unwrap();
    assert_eq!(view.slots_left, 11);
    assert_eq!(events.my_events().await.len(), 1);
}

#[tokio::test]
async fn test_state_survives_reopening_the_store() {
    let dir = TempDir::new().unwrap();

    {
        let kv = open_kv(&dir);
        let store: Arc<dyn LocalStore> = kv.clone();
        let session = signed_in(&store).await;

        EventsController::new(Arc::clone(&store), Arc::clone(&session))
            .register("5")
            .await
            .unwrap();
        ForumController::new(Arc::clone(&store), Arc::clone(&session))
            .create_thread(NewThread {
                title: "Tips foto produk".to_string(),
                content: "Pakai cahaya alami dari jendela.".to_string(),
                category: String::new(),
            })
            .await
            .unwrap();

        kv.flush().unwrap();
    }

    let store = open_store(&dir);
    let session = Arc::new(SessionContext::restore(Arc::clone(&store)).await);
    assert_eq!(session.require_user().unwrap(), siti());

    let events = EventsController::new(Arc::clone(&store), Arc::clone(&session));
    let view = events.load().await.into_iter().find(|v| v.event.id == "5").unwrap();
    assert!(view.is_registered);
    assert_eq!(view.slots_left, 99);

    let threads = ForumController::new(Arc::clone(&store), session).load().await;
    assert_eq!(threads[0].thread.title, "Tips foto produk");
    assert_eq!(threads[0].thread.category, "Umum");
    assert_eq!(threads.len(), seed_threads().len() + 1);
}
