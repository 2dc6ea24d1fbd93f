//! Command-line front end
//!
//! Every screen and action passes the route guard before any service call.

pub mod render;

use std::future::Future;

use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::{
    dashboard::{load_dashboard, load_reports},
    error::{AppError, AppResult},
    models::{
        enums::{PaymentMethod, Role},
        envelope::Page,
    },
    session::{guard, guard_route, GuardDecision, Route, Session},
    views::{
        forms::{
            BookForm, ChangePasswordForm, CheckoutForm, DeleteBookConfirmation, EditUserForm, PayFineForm,
            ReminderConfigForm, RoomBookingForm, UserForm, WaiveFineForm,
        },
        pages, Debouncer, FormModel, ListFilters, ListView, Modal, SettingsView, Viewer,
    },
    Portal,
};
use render::Row;

const STAFF: &[Role] = &[Role::Admin, Role::Librarian];
const ADMIN: &[Role] = &[Role::Admin];
/// Fines are looked up by id within the first page of this size
const FINE_LOOKUP_SIZE: u32 = 200;

#[derive(Parser, Debug)]
#[command(name = "library-portal")]
#[command(about = "Library management portal", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sign in and keep the session for later commands
    Login {
        #[arg(short, long, env = "LIBRARY_PORTAL_USERNAME")]
        username: String,
        #[arg(short, long, env = "LIBRARY_PORTAL_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// End the session and forget the stored token
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Change the password of the signed-in user
    ChangePassword {
        #[arg(long, env = "LIBRARY_PORTAL_PASSWORD", hide_env_values = true)]
        current: String,
        #[arg(long)]
        new: String,
        #[arg(long)]
        confirm: String,
    },

    /// Open a screen, e.g. `open books --search dune`
    Open(OpenArgs),

    /// Catalog management
    #[command(subcommand)]
    Book(BookCommand),

    /// Checkouts, returns and renewals
    #[command(subcommand)]
    Loan(LoanCommand),

    /// Book reservations
    #[command(subcommand)]
    Reserve(ReserveCommand),

    /// User accounts
    #[command(subcommand)]
    User(UserCommand),

    /// Fine payments
    #[command(subcommand)]
    Fine(FineCommand),

    /// Reminder scheduler
    #[command(subcommand)]
    Reminder(ReminderCommand),

    /// Study room bookings
    #[command(subcommand)]
    Room(RoomCommand),
}

#[derive(Args, Debug, Clone)]
pub struct OpenArgs {
    /// Route path or name: dashboard, books, users, loans, payments, ...
    #[arg(value_name = "ROUTE", default_value = "/")]
    pub route: String,

    /// Free-text search
    #[arg(short, long)]
    pub search: Option<String>,

    /// Page number, starting at 1
    #[arg(short, long, default_value_t = 1)]
    pub page: u32,

    /// Filter as key=value, repeatable (status=overdue, genre=fantasy, kind=reservations)
    #[arg(short, long = "filter", value_parser = parse_key_val)]
    pub filters: Vec<(String, String)>,

    /// Keep reading search terms from stdin and refresh the list
    #[arg(long)]
    pub follow: bool,
}

#[derive(Args, Debug, Clone)]
pub struct BookFields {
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub author: Option<String>,
    #[arg(long)]
    pub isbn: Option<String>,
    #[arg(long)]
    pub genre: Option<String>,
    #[arg(long)]
    pub publisher: Option<String>,
    #[arg(long)]
    pub year: Option<i32>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub location: Option<String>,
    #[arg(long)]
    pub copies: Option<u32>,
}

impl BookFields {
    fn apply(self, form: &mut BookForm) {
        let set = |target: &mut String, value: Option<String>| {
            if let Some(value) = value {
                *target = value;
            }
        };
        set(&mut form.title, self.title);
        set(&mut form.author, self.author);
        set(&mut form.isbn, self.isbn);
        set(&mut form.genre, self.genre);
        set(&mut form.publisher, self.publisher);
        set(&mut form.description, self.description);
        set(&mut form.location, self.location);
        if self.year.is_some() {
            form.publication_year = self.year;
        }
        if let Some(copies) = self.copies {
            form.total_copies = copies;
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum BookCommand {
    /// Add a book to the catalog
    Add(BookFields),
    /// Edit a book; only the given fields change
    Edit {
        id: i64,
        #[command(flatten)]
        fields: BookFields,
    },
    /// Delete a book; the exact title must be typed to confirm
    Delete {
        id: i64,
        #[arg(long, value_name = "TITLE")]
        confirm_title: String,
    },
    /// Mark copies as lost
    Lost {
        id: i64,
        #[arg(long, default_value_t = 1)]
        count: u32,
    },
    /// Add copies of an existing book
    Copies {
        id: i64,
        #[arg(long)]
        count: u32,
    },
    /// List the genres in use
    Genres,
}

#[derive(Subcommand, Debug)]
pub enum LoanCommand {
    /// Check out books to a patron
    Checkout {
        #[arg(long)]
        user: i64,
        #[arg(long = "book", required = true)]
        books: Vec<i64>,
        #[arg(long, value_name = "YYYY-MM-DD")]
        due: Option<NaiveDate>,
    },
    /// Borrow a single book; staff may borrow on behalf of a patron
    Borrow {
        #[arg(long)]
        book: i64,
        #[arg(long)]
        user: Option<i64>,
    },
    Return { id: i64 },
    Renew { id: i64 },
}

#[derive(Subcommand, Debug)]
pub enum ReserveCommand {
    /// Reserve a book; staff may reserve on behalf of a patron
    Add {
        #[arg(long)]
        book: i64,
        #[arg(long)]
        user: Option<i64>,
    },
    Cancel { id: i64 },
}

#[derive(Subcommand, Debug)]
pub enum UserCommand {
    Add {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "LIBRARY_PORTAL_NEW_USER_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long, default_value = "STUDENT")]
        role: String,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        student_id: Option<String>,
    },
    /// Edit a profile; only the given fields change
    Edit {
        id: i64,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        role: Option<String>,
    },
    Delete { id: i64 },
    Activate { id: i64 },
    Deactivate { id: i64 },
}

#[derive(Subcommand, Debug)]
pub enum FineCommand {
    /// Pay a fine; defaults to the full amount in cash
    Pay {
        id: i64,
        #[arg(long)]
        amount: Option<Decimal>,
        #[arg(long, default_value = "CASH")]
        method: PaymentMethod,
    },
    Waive {
        id: i64,
        #[arg(long)]
        reason: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ReminderCommand {
    /// Run the reminder job now
    Trigger,
    /// Resend failed reminders
    Retry,
    /// Show the scheduler configuration, or change it
    Config {
        #[arg(long)]
        enabled: Option<bool>,
        #[arg(long)]
        days_before_due: Option<u32>,
        #[arg(long)]
        overdue_interval_days: Option<u32>,
        #[arg(long)]
        max_overdue_reminders: Option<u32>,
        #[arg(long, value_name = "HH:MM")]
        send_time: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum RoomCommand {
    /// Book a room; times are RFC 3339, e.g. 2026-10-20T14:00:00Z
    Book {
        #[arg(long)]
        room: i64,
        #[arg(long)]
        start: DateTime<Utc>,
        #[arg(long)]
        end: DateTime<Utc>,
        #[arg(long, default_value_t = 1)]
        attendees: u32,
        #[arg(long)]
        purpose: Option<String>,
    },
    Cancel { id: i64 },
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got `{}`", s))?;
    Ok((key.trim().to_string(), value.trim().to_string()))
}

/// Run one command against the portal
pub async fn run(cli: Cli, portal: &Portal) -> AppResult<()> {
    if let Command::Login { username, password } = &cli.command {
        let state = portal.session.login(username, password).await?;
        return match state.session() {
            Some(session) if state.user().is_some_and(|u| u.must_change_password) => {
                println!(
                    "Signed in as {}. You must change your password before continuing: library-portal change-password",
                    session.user.username
                );
                Ok(())
            }
            Some(session) => {
                println!("Signed in as {} ({})", session.user.username, session.user.role);
                Ok(())
            }
            None => Err(AppError::Session("Login did not produce a session".to_string())),
        };
    }

    // Logging out needs no backend
    if let Command::Logout = cli.command {
        portal.session.logout().await;
        println!("Signed out");
        return Ok(());
    }

    let restored = portal.session.restore().await;
    if let Command::Whoami = cli.command {
        match restored {
            Ok(state) => match state.user() {
                Some(user) => println!("{}", render::profile(user)),
                None => println!("Not signed in"),
            },
            Err(e) => println!("Stored session could not be verified: {}", e.user_message()),
        }
        return Ok(());
    }
    restored?;

    match cli.command {
        Command::Login { .. } | Command::Logout | Command::Whoami => Ok(()),
        Command::ChangePassword { current, new, confirm } => change_password(portal, current, new, confirm).await,
        Command::Open(args) => open(portal, args).await,
        Command::Book(command) => book(portal, command).await,
        Command::Loan(command) => loan(portal, command).await,
        Command::Reserve(command) => reserve(portal, command).await,
        Command::User(command) => user(portal, command).await,
        Command::Fine(command) => fine(portal, command).await,
        Command::Reminder(command) => reminder(portal, command).await,
        Command::Room(command) => room(portal, command).await,
    }
}

/// Check `route` for `roles` and hand back the session it may act for
async fn authorize(portal: &Portal, route: Route, roles: &[Role]) -> AppResult<Session> {
    let state = portal.session.get_session().await;
    match guard(route, roles, &state) {
        GuardDecision::Render => state
            .session()
            .cloned()
            .ok_or_else(|| AppError::Authentication("Please sign in first: library-portal login".to_string())),
        GuardDecision::Redirect(Route::Login) => Err(AppError::Authentication(
            "Please sign in first: library-portal login".to_string(),
        )),
        GuardDecision::Redirect(Route::ChangePassword) => Err(AppError::Authorization(
            "You must change your password first: library-portal change-password".to_string(),
        )),
        GuardDecision::Redirect(_) | GuardDecision::Denied => Err(AppError::Authorization(format!(
            "{} is not available to your role",
            route.title()
        ))),
        GuardDecision::UnknownRole(role) => Err(AppError::Authorization(render::unknown_role(&role))),
        GuardDecision::Pending => Err(AppError::Session("Session is still loading".to_string())),
    }
}

/// Open a modal on `form`, submit it once and print the outcome
async fn submit<F, T, A, Fut>(portal: &Portal, form: F, action: A, success_message: &str) -> AppResult<T>
where
    F: FormModel,
    A: FnOnce(F) -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let mut modal = Modal::new(&portal.config.ui);
    modal.open(form);
    let result = modal.submit(action, success_message, |_| {}).await;
    if let Some(toast) = modal.outcome() {
        println!("{}", render::toast(toast));
    }
    // Keep the success toast up for the configured delay
    modal.auto_close().await;
    match result? {
        Some(value) => Ok(value),
        None => {
            eprintln!("{}", render::field_errors(modal.errors()));
            let first = modal.errors().values().next().cloned();
            Err(AppError::Validation(first.unwrap_or_else(|| "Invalid input".to_string())))
        }
    }
}

async fn change_password(portal: &Portal, current: String, new: String, confirm: String) -> AppResult<()> {
    authorize(portal, Route::ChangePassword, Route::ChangePassword.allowed_roles()).await?;
    let form = ChangePasswordForm {
        current_password: current,
        new_password: new,
        confirm_password: confirm,
    };
    let (state, message) = portal.session.change_password(&form).await?;
    println!("{}", message.unwrap_or_else(|| "Password changed".to_string()));
    if !state.is_authenticated() {
        println!("Please sign in again with your new password");
    }
    Ok(())
}

async fn open(portal: &Portal, args: OpenArgs) -> AppResult<()> {
    let state = portal.session.get_session().await;
    let requested = if args.route.trim().trim_matches('/').is_empty() {
        None
    } else {
        Some(args.route.parse::<Route>().map_err(AppError::Validation)?)
    };

    let decision = match requested {
        Some(route) => guard_route(route, &state),
        None => crate::session::landing(&state),
    };
    let route = match (decision, requested) {
        (GuardDecision::Render, Some(route)) => route,
        (GuardDecision::Render, None) => Route::Dashboard,
        (GuardDecision::Redirect(target), _) => {
            if requested.is_some() {
                println!("Redirected to {}", target);
            }
            target
        }
        (GuardDecision::UnknownRole(role), _) => {
            println!("{}", render::unknown_role(&role));
            return Ok(());
        }
        (GuardDecision::Pending, _) => return Err(AppError::Session("Session is still loading".to_string())),
        (GuardDecision::Denied, _) => {
            return Err(AppError::Authorization("No screen is available to your role".to_string()))
        }
    };

    let session = match (route, state.session()) {
        (Route::Login, _) => {
            println!("Sign in with: library-portal login --username <name>");
            return Ok(());
        }
        (Route::ChangePassword, _) => {
            println!("Change your password with: library-portal change-password --current <old> --new <new> --confirm <new>");
            return Ok(());
        }
        (_, Some(session)) => session.clone(),
        (_, None) => return Err(AppError::Authentication("Please sign in first".to_string())),
    };
    let viewer = Viewer::from_session(&session);
    let services = portal.services.as_ref();
    let kind = args
        .filters
        .iter()
        .find(|(key, _)| key == "kind")
        .map(|(_, value)| value.to_ascii_lowercase());

    match route {
        Route::Login | Route::ChangePassword => Ok(()),
        Route::Dashboard => {
            println!("{}", render::dashboard(&load_dashboard(services, &viewer).await));
            Ok(())
        }
        Route::Reports => {
            println!("{}", render::reports(&load_reports(services, &viewer).await?));
            Ok(())
        }
        Route::Settings => {
            println!("{}", render::settings(&SettingsView::new(&portal.config, &session)));
            Ok(())
        }
        Route::Books => {
            list_screen(portal, &args, "Books", |filters| async move {
                pages::fetch_books(services, &filters).await
            })
            .await
        }
        Route::Users => {
            list_screen(portal, &args, "Users", |filters| {
                let viewer = &viewer;
                async move { pages::fetch_users(services, viewer, &filters).await }
            })
            .await
        }
        Route::Loans if kind.as_deref() == Some("reservations") => {
            list_screen(portal, &args, "Reservations", |filters| {
                let viewer = &viewer;
                async move { pages::fetch_reservations(services, viewer, &filters).await }
            })
            .await
        }
        Route::Loans => {
            list_screen(portal, &args, "Loans", |filters| {
                let viewer = &viewer;
                async move { pages::fetch_loans(services, viewer, &filters).await }
            })
            .await
        }
        Route::Payments => {
            list_screen(portal, &args, "Fines", |filters| {
                let viewer = &viewer;
                async move { pages::fetch_fines(services, viewer, &filters).await }
            })
            .await
        }
        Route::Reminders => {
            match services.reminders.health().await {
                Ok(health) => println!("Reminder service: {}", render::reminder_health(&health)),
                Err(e) => println!("Reminder service: unavailable ({})", e.user_message()),
            }
            list_screen(portal, &args, "Reminder log", |filters| {
                let viewer = &viewer;
                async move { pages::fetch_reminder_logs(services, viewer, &filters).await }
            })
            .await
        }
        Route::RoomBookings if kind.as_deref() == Some("rooms") => {
            let rooms = services.rooms.rooms().await?;
            println!("Rooms\n{}", render::rows(&rooms));
            Ok(())
        }
        Route::RoomBookings => {
            list_screen(portal, &args, "Room bookings", |filters| {
                let viewer = &viewer;
                async move { pages::fetch_room_bookings(services, viewer, &filters).await }
            })
            .await
        }
        Route::Notifications => {
            list_screen(portal, &args, "Notifications", |filters| {
                let viewer = &viewer;
                async move { pages::fetch_notifications(services, viewer, &filters).await }
            })
            .await
        }
    }
}

async fn list_screen<T, F, Fut>(portal: &Portal, args: &OpenArgs, title: &str, fetch: F) -> AppResult<()>
where
    T: Row,
    F: Fn(ListFilters) -> Fut,
    Fut: Future<Output = AppResult<Page<T>>>,
{
    let mut view = ListView::new(portal.config.ui.page_size);
    if let Some(search) = &args.search {
        view.set_search(search.clone());
    }
    for (key, value) in args.filters.iter().filter(|(key, _)| key != "kind") {
        view.set_filter(key, Some(value.clone()));
    }
    view.set_page(args.page.saturating_sub(1));

    view.load(&fetch).await;
    println!("{}", render::list(title, &view));

    if args.follow {
        follow(portal, &mut view, title, &fetch).await?;
    }
    Ok(())
}

/// Treat stdin lines as keystrokes in the search box
async fn follow<T, F, Fut>(portal: &Portal, view: &mut ListView<T>, title: &str, fetch: &F) -> AppResult<()>
where
    T: Row,
    F: Fn(ListFilters) -> Fut,
    Fut: Future<Output = AppResult<Page<T>>>,
{
    let debouncer = Debouncer::new(portal.config.ui.search_debounce());
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<String>();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    eprintln!("Type a search and press enter, :next or :prev to page; an empty line quits");

    loop {
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(text) if matches!(text.trim(), ":next" | ":prev") => {
                    let moved = if text.trim() == ":next" { view.next_page() } else { view.previous_page() };
                    if moved {
                        view.load(fetch).await;
                    }
                    println!("{}", render::list(title, view));
                }
                Some(text) if !text.trim().is_empty() => {
                    let debouncer = debouncer.clone();
                    let tx = tx.clone();
                    tokio::spawn(async move {
                        if let Some(text) = debouncer.settle(text).await {
                            let _ = tx.send(text);
                        }
                    });
                }
                _ => break,
            },
            Some(search) = rx.recv() => {
                if view.set_search(search) {
                    view.load(fetch).await;
                    println!("{}", render::list(title, view));
                }
            }
        }
    }
    debouncer.cancel();
    Ok(())
}

async fn book(portal: &Portal, command: BookCommand) -> AppResult<()> {
    authorize(portal, Route::Books, STAFF).await?;
    let books = &portal.services.books;

    match command {
        BookCommand::Add(fields) => {
            let mut form = BookForm::new();
            fields.apply(&mut form);
            let book = submit(portal, form, |f| async move { books.create(&f.to_payload()).await }, "Book created").await?;
            println!("{}", render::rows(&[book]));
        }
        BookCommand::Edit { id, fields } => {
            let current = books.get(id).await?;
            let mut form = BookForm::from_book(&current);
            fields.apply(&mut form);
            let book = submit(
                portal,
                form,
                |f| async move { books.update(id, &f.to_payload()).await },
                "Book updated",
            )
            .await?;
            println!("{}", render::rows(&[book]));
        }
        BookCommand::Delete { id, confirm_title } => {
            let mut confirmation = DeleteBookConfirmation::new(books.get(id).await?);
            confirmation.type_title(&confirm_title);
            let message = submit(
                portal,
                confirmation,
                |c| async move { books.delete(c.book().id).await },
                "Book deleted",
            )
            .await?;
            if let Some(message) = message {
                println!("{}", message);
            }
        }
        BookCommand::Lost { id, count } => {
            let book = books.mark_lost(id, count).await?;
            println!("{}", render::rows(&[book]));
        }
        BookCommand::Copies { id, count } => {
            if count == 0 {
                return Err(AppError::Validation("Count must be at least 1".to_string()));
            }
            let book = books.add_copies(id, count).await?;
            println!("{}", render::rows(&[book]));
        }
        BookCommand::Genres => {
            for genre in books.genres().await? {
                println!("{}", genre);
            }
        }
    }
    Ok(())
}

async fn loan(portal: &Portal, command: LoanCommand) -> AppResult<()> {
    let loans = &portal.services.loans;
    match command {
        LoanCommand::Checkout { user, books, due } => {
            authorize(portal, Route::Loans, STAFF).await?;
            let mut form = CheckoutForm {
                user_id: Some(user),
                due_date: due,
                ..Default::default()
            };
            for book_id in books {
                form.add_book(book_id);
            }
            let records = submit(
                portal,
                form,
                |f| async move {
                    let request = f
                        .to_request()
                        .ok_or_else(|| AppError::Validation("Select a patron".to_string()))?;
                    loans.checkout(&request).await
                },
                "Books checked out",
            )
            .await?;
            println!("{}", render::rows(&records));
        }
        LoanCommand::Borrow { book, user } => {
            let session = authorize(portal, Route::Books, Route::Books.allowed_roles()).await?;
            let viewer = Viewer::from_session(&session);
            let user_id = on_behalf_of(&viewer, user, "borrow")?;
            let record = loans.borrow(user_id, book).await?;
            println!("{}", render::rows(&[record]));
        }
        LoanCommand::Return { id } => {
            authorize(portal, Route::Loans, STAFF).await?;
            let record = loans.return_loan(id).await?;
            println!("{}", render::rows(&[record]));
        }
        LoanCommand::Renew { id } => {
            authorize(portal, Route::Loans, Route::Loans.allowed_roles()).await?;
            let record = loans.renew(id).await?;
            println!("{}", render::rows(&[record]));
        }
    }
    Ok(())
}

async fn reserve(portal: &Portal, command: ReserveCommand) -> AppResult<()> {
    let session = authorize(portal, Route::Books, Route::Books.allowed_roles()).await?;
    let viewer = Viewer::from_session(&session);
    let loans = &portal.services.loans;
    match command {
        ReserveCommand::Add { book, user } => {
            let user_id = on_behalf_of(&viewer, user, "reserve")?;
            let reservation = loans.reserve(user_id, book).await?;
            println!("{}", render::rows(&[reservation]));
        }
        ReserveCommand::Cancel { id } => {
            let message = loans.cancel_reservation(id).await?;
            println!("{}", message.unwrap_or_else(|| "Reservation cancelled".to_string()));
        }
    }
    Ok(())
}

/// The patron an action is for: the viewer, or anyone when the viewer is staff
fn on_behalf_of(viewer: &Viewer, user: Option<i64>, action: &str) -> AppResult<i64> {
    match user {
        Some(other) if other != viewer.user_id && !viewer.is_staff() => Err(AppError::Authorization(format!(
            "Only staff can {} on behalf of another user",
            action
        ))),
        Some(other) => Ok(other),
        None => Ok(viewer.user_id),
    }
}

async fn user(portal: &Portal, command: UserCommand) -> AppResult<()> {
    authorize(portal, Route::Users, ADMIN).await?;
    let users = &portal.services.users;
    match command {
        UserCommand::Add {
            username,
            email,
            password,
            first_name,
            last_name,
            role,
            phone,
            student_id,
        } => {
            let mut form = UserForm::new(Role::parse(&role));
            form.username = username;
            form.email = email;
            form.password = password;
            form.first_name = first_name;
            form.last_name = last_name;
            form.phone = phone.unwrap_or_default();
            form.student_id = student_id.unwrap_or_default();
            let created = submit(portal, form, |f| async move { users.create(&f.to_create()).await }, "User created").await?;
            println!("{}", render::rows(&[created]));
        }
        UserCommand::Edit {
            id,
            email,
            first_name,
            last_name,
            phone,
            role,
        } => {
            let mut form = EditUserForm::from_user(&users.get(id).await?);
            if let Some(email) = email {
                form.email = email;
            }
            if let Some(first_name) = first_name {
                form.first_name = first_name;
            }
            if let Some(last_name) = last_name {
                form.last_name = last_name;
            }
            if let Some(phone) = phone {
                form.phone = phone;
            }
            if let Some(role) = role {
                form.role = role.parse().map_err(AppError::Validation)?;
            }
            let updated = submit(
                portal,
                form,
                |f| async move { users.update(id, &f.to_update()).await },
                "User updated",
            )
            .await?;
            println!("{}", render::rows(&[updated]));
        }
        UserCommand::Delete { id } => {
            let message = users.delete(id).await?;
            println!("{}", message.unwrap_or_else(|| "User deleted".to_string()));
        }
        UserCommand::Activate { id } => {
            let message = users.activate(id).await?;
            println!("{}", message.unwrap_or_else(|| "User activated".to_string()));
        }
        UserCommand::Deactivate { id } => {
            let message = users.deactivate(id).await?;
            println!("{}", message.unwrap_or_else(|| "User deactivated".to_string()));
        }
    }
    Ok(())
}

async fn fine(portal: &Portal, command: FineCommand) -> AppResult<()> {
    let payments = &portal.services.payments;
    match command {
        FineCommand::Pay { id, amount, method } => {
            let session = authorize(portal, Route::Payments, Route::Payments.allowed_roles()).await?;
            let viewer = Viewer::from_session(&session);
            let fines = if viewer.is_staff() {
                payments.fines(0, FINE_LOOKUP_SIZE).await?
            } else {
                payments.fines_for_user(viewer.user_id).await?
            };
            let target = fines
                .items
                .into_iter()
                .find(|f| f.id == id)
                .ok_or_else(|| AppError::NotFound(format!("Fine {} not found", id)))?;
            if !target.is_outstanding() {
                return Err(AppError::Conflict(format!("Fine {} is already {}", id, target.status)));
            }
            let mut form = PayFineForm::for_amount(target.amount);
            form.method = method;
            if let Some(amount) = amount {
                form.amount = amount;
            }
            let paid = submit(
                portal,
                form,
                |f| async move { payments.pay(id, &f.to_request()).await },
                "Payment recorded",
            )
            .await?;
            println!("{}", render::rows(&[paid]));
        }
        FineCommand::Waive { id, reason } => {
            authorize(portal, Route::Payments, STAFF).await?;
            let waived = submit(
                portal,
                WaiveFineForm { reason },
                |f| async move { payments.waive(id, &f.to_request()).await },
                "Fine waived",
            )
            .await?;
            println!("{}", render::rows(&[waived]));
        }
    }
    Ok(())
}

async fn reminder(portal: &Portal, command: ReminderCommand) -> AppResult<()> {
    authorize(portal, Route::Reminders, ADMIN).await?;
    let reminders = &portal.services.reminders;
    match command {
        ReminderCommand::Trigger => {
            let result = reminders.trigger().await?;
            println!("Reminder run: {}", render::reminder_run(&result));
        }
        ReminderCommand::Retry => {
            let result = reminders.retry_failed().await?;
            println!("Retry: {}", render::reminder_run(&result));
        }
        ReminderCommand::Config {
            enabled,
            days_before_due,
            overdue_interval_days,
            max_overdue_reminders,
            send_time,
        } => {
            let current = reminders.config().await?;
            let unchanged = enabled.is_none()
                && days_before_due.is_none()
                && overdue_interval_days.is_none()
                && max_overdue_reminders.is_none()
                && send_time.is_none();
            if unchanged {
                println!("{}", render::reminder_config(&current));
                return Ok(());
            }

            let mut form = ReminderConfigForm::from_config(&current);
            form.enabled = enabled.unwrap_or(form.enabled);
            form.days_before_due = days_before_due.unwrap_or(form.days_before_due);
            form.overdue_interval_days = overdue_interval_days.unwrap_or(form.overdue_interval_days);
            form.max_overdue_reminders = max_overdue_reminders.unwrap_or(form.max_overdue_reminders);
            if send_time.is_some() {
                form.send_time = send_time;
            }
            let updated = submit(
                portal,
                form,
                |f| async move { reminders.update_config(&f.to_config()).await },
                "Reminder settings saved",
            )
            .await?;
            println!("{}", render::reminder_config(&updated));
        }
    }
    Ok(())
}

async fn room(portal: &Portal, command: RoomCommand) -> AppResult<()> {
    let session = authorize(portal, Route::RoomBookings, Route::RoomBookings.allowed_roles()).await?;
    let rooms = &portal.services.rooms;
    match command {
        RoomCommand::Book {
            room,
            start,
            end,
            attendees,
            purpose,
        } => {
            let target = rooms
                .rooms()
                .await?
                .into_iter()
                .find(|r| r.id == room)
                .ok_or_else(|| AppError::NotFound(format!("Room {} not found", room)))?;
            let mut form = RoomBookingForm::new(target, session.user.id);
            form.start_time = Some(start);
            form.end_time = Some(end);
            form.attendees = attendees;
            form.purpose = purpose.unwrap_or_default();
            let booking = submit(
                portal,
                form,
                |f| async move {
                    let request = f
                        .to_request()
                        .ok_or_else(|| AppError::Validation("Start and end time are required".to_string()))?;
                    rooms.book(&request).await
                },
                "Room booked",
            )
            .await?;
            println!("{}", render::rows(&[booking]));
        }
        RoomCommand::Cancel { id } => {
            let message = rooms.cancel(id).await?;
            println!("{}", message.unwrap_or_else(|| "Booking cancelled".to_string()));
        }
    }
    Ok(())
}
