//! List screens, modal submits and dashboards against the mock backend

use std::cell::Cell;

use pretty_assertions::assert_eq;

use library_portal::{
    dashboard::{load_dashboard, Dashboard},
    models::{book::Book, loan::BorrowRecord},
    views::{
        forms::{BookForm, FORM_ERROR},
        pages::{fetch_books, fetch_loans},
        ListView, Modal, ToastKind, Viewer,
    },
    AppError, Portal,
};

use crate::common::{MockBackend, ADMIN_PASSWORD};

async fn signed_in(backend: &MockBackend, username: &str) -> (Portal, Viewer) {
    let portal = backend.portal();
    let state = portal.session.login(username, ADMIN_PASSWORD).await.unwrap();
    let viewer = Viewer::from_session(state.session().unwrap());
    (portal, viewer)
}

#[tokio::test]
async fn test_books_list_reads_spring_page() {
    let backend = MockBackend::start().await;
    let (portal, _) = signed_in(&backend, "admin").await;
    let services = &*portal.services;

    let mut books: ListView<Book> = ListView::new(10);
    assert!(books.load(|filters| async move { fetch_books(services, &filters).await }).await);

    assert_eq!(books.error(), None);
    assert_eq!(books.items().len(), 2);
    assert_eq!(books.total_pages(), 2);
    assert_eq!(books.total_elements(), 12);
    assert!(books.has_next());
    assert!(!books.has_previous());
    assert_eq!(books.items()[0].borrowed_copies(), 1);

    let calls = backend.state.requests_to("/api/books");
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].query.as_deref(), Some("page=0&size=10"));
    assert!(calls[0].authorization.as_deref().unwrap_or_default().starts_with("Bearer "));
    assert!(calls[0].request_id.is_some());
}

#[tokio::test]
async fn test_search_uses_search_endpoint_with_bare_array() {
    let backend = MockBackend::start().await;
    let (portal, _) = signed_in(&backend, "librarian").await;
    let services = &*portal.services;

    let mut books: ListView<Book> = ListView::new(10);
    assert!(books.set_search("dune"));
    books.load(|filters| async move { fetch_books(services, &filters).await }).await;

    assert_eq!(books.items().len(), 1);
    assert_eq!(books.items()[0].title, "Dune");
    assert_eq!(books.total_pages(), 1);
    assert!(!books.has_next());
    assert_eq!(backend.state.requests_to("/api/books/search").len(), 1);
    assert!(backend.state.requests_to("/api/books").is_empty());
}

#[tokio::test]
async fn test_stale_response_is_dropped() {
    let backend = MockBackend::start().await;
    let (portal, _) = signed_in(&backend, "librarian").await;

    let mut books: ListView<Book> = ListView::new(10);
    let first = books.begin_fetch();
    books.set_search("clean");
    let second = books.begin_fetch();

    let (slow, fast) = tokio::join!(
        fetch_books(&portal.services, &first.filters),
        fetch_books(&portal.services, &second.filters),
    );
    assert!(books.apply(second, fast));
    assert!(!books.apply(first, slow));

    let titles: Vec<&str> = books.items().iter().map(|b| b.title.as_str()).collect();
    assert_eq!(titles, vec!["Clean Code"]);
}

#[tokio::test]
async fn test_failed_envelope_shows_error_state() {
    let backend = MockBackend::start().await;
    let (portal, viewer) = signed_in(&backend, "librarian").await;
    let services = &*portal.services;

    let mut loans: ListView<BorrowRecord> = ListView::new(10);
    loans.set_filter("status", Some("overdue".to_string()));
    loans
        .load(|filters| async move { fetch_loans(services, &viewer, &filters).await })
        .await;

    assert_eq!(loans.error(), Some("Borrow service is degraded"));
    assert!(loans.items().is_empty());
    // An error is not the empty state
    assert!(!loans.is_empty_state());
}

#[tokio::test]
async fn test_signed_out_list_reports_rejected_token() {
    let backend = MockBackend::start().await;
    let portal = backend.portal();
    let services = &*portal.services;

    let mut books: ListView<Book> = ListView::new(10);
    books.load(|filters| async move { fetch_books(services, &filters).await }).await;
    assert_eq!(books.error(), Some("Token is invalid or expired"));
    assert_eq!(backend.state.requests_to("/api/books")[0].authorization, None);
}

#[tokio::test]
async fn test_create_book_modal_submits_once_and_refreshes() {
    let backend = MockBackend::start().await;
    let (portal, _) = signed_in(&backend, "admin").await;
    let books_service = &portal.services.books;
    let refreshed = Cell::new(0);

    let mut modal: Modal<BookForm> = Modal::new(&portal.config.ui);
    modal.open(BookForm {
        title: "Refactoring".to_string(),
        author: "Martin Fowler".to_string(),
        total_copies: 4,
        ..BookForm::new()
    });

    let created = modal
        .submit(
            |form| async move { books_service.create(&form.to_payload()).await },
            "Book created",
            |_| refreshed.set(refreshed.get() + 1),
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(created.title, "Refactoring");
    assert_eq!(created.available_copies, 4);
    assert_eq!(refreshed.get(), 1);
    assert_eq!(modal.outcome().map(|t| t.kind), Some(ToastKind::Success));
    assert_eq!(backend.state.requests_to("/api/books").len(), 1);
}

#[tokio::test]
async fn test_rejected_create_keeps_modal_open() {
    let backend = MockBackend::start().await;
    let (portal, _) = signed_in(&backend, "admin").await;
    let books_service = &portal.services.books;
    let refreshed = Cell::new(false);

    let mut modal: Modal<BookForm> = Modal::new(&portal.config.ui);
    modal.open(BookForm {
        title: "Dune".to_string(),
        author: "Frank Herbert".to_string(),
        ..BookForm::new()
    });

    let err = modal
        .submit(
            |form| async move { books_service.create(&form.to_payload()).await },
            "Book created",
            |_| refreshed.set(true),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Conflict(_)));
    assert!(modal.is_open());
    assert!(!modal.is_loading());
    assert_eq!(modal.error(FORM_ERROR), Some("A book with this title already exists"));
    assert!(!refreshed.get());

    // Invalid input never leaves the client
    if let Some(form) = modal.form_mut() {
        form.title = "   ".to_string();
    }
    let sent = modal
        .submit(
            |form| async move { books_service.create(&form.to_payload()).await },
            "Book created",
            |_| refreshed.set(true),
        )
        .await
        .unwrap();
    assert!(sent.is_none());
    assert_eq!(modal.error("title"), Some("Title is required"));
    assert_eq!(backend.state.requests_to("/api/books").len(), 1);
}

#[tokio::test]
async fn test_librarian_dashboard_isolates_failed_panel() {
    let backend = MockBackend::start().await;
    let (portal, viewer) = signed_in(&backend, "librarian").await;

    let Dashboard::Librarian(dashboard) = load_dashboard(&portal.services, &viewer).await else {
        panic!("expected the librarian dashboard");
    };

    assert_eq!(dashboard.overdue.unwrap_err(), "Borrow service is degraded");
    assert_eq!(dashboard.total_books, Ok(12));
    assert_eq!(dashboard.active_loans, Ok(0));
    assert_eq!(dashboard.open_reservations, Ok(0));
    assert_eq!(dashboard.fines.map(|f| f.outstanding_count), Ok(3));
}
