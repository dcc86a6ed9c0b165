use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::gateway::{ApiClient, ApiResponse, BookingRequest, LoginRequest, Registration, RoomForm};
use crate::session::Session;
use crate::shell::Shell;

#[derive(Parser)]
#[command(name = "zikhron")]
#[command(about = "Zikhron Hotel - reservation client", long_about = None)]
pub struct Cli {
    /// Backend base URL (overrides BACKEND_API_URL)
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new account
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        phone: String,
    },

    /// Sign in and remember the token and role
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },

    /// Forget the stored token and role
    Logout,

    /// Show the local session state
    Status,

    /// Check that the backend answers
    Hello,

    /// User management commands
    #[command(subcommand)]
    Users(UserCommands),

    /// Room inventory commands
    #[command(subcommand)]
    Rooms(RoomCommands),

    /// Booking commands
    #[command(subcommand)]
    Bookings(BookingCommands),

    /// Render a page of the application shell
    Open {
        #[arg(default_value = "/home")]
        path: String,
    },
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// List all users (admin)
    List,
    /// Show the signed-in user's profile
    Profile,
    /// Show a user by ID
    Get { id: String },
    /// List a user's bookings
    Bookings { id: String },
    /// Delete a user
    Delete { id: String },
}

#[derive(Subcommand)]
pub enum RoomCommands {
    /// List rooms that are currently free
    Available,
    /// Find rooms free between two dates
    Search {
        #[arg(long, value_name = "YYYY-MM-DD")]
        check_in: NaiveDate,
        #[arg(long, value_name = "YYYY-MM-DD")]
        check_out: NaiveDate,
        #[arg(long)]
        room_type: String,
    },
    /// List the distinct room types
    Types,
    /// List every room
    List,
    /// Show a room by ID
    Get { id: String },
    /// Add a room (admin)
    Add(RoomFields),
    /// Update a room (admin)
    Update {
        id: String,
        #[command(flatten)]
        fields: RoomFields,
    },
    /// Delete a room (admin)
    Delete { id: String },
}

#[derive(clap::Args)]
pub struct RoomFields {
    #[arg(long)]
    pub room_type: Option<String>,
    #[arg(long)]
    pub price: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    /// Image file uploaded as the room photo
    #[arg(long, value_name = "FILE")]
    pub photo: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum BookingCommands {
    /// Book a room for a user
    Book {
        room_id: String,
        user_id: String,
        #[arg(long, value_name = "YYYY-MM-DD")]
        check_in: NaiveDate,
        #[arg(long, value_name = "YYYY-MM-DD")]
        check_out: NaiveDate,
        #[arg(long, default_value_t = 1)]
        adults: u32,
        #[arg(long, default_value_t = 0)]
        children: u32,
    },
    /// List all bookings (admin)
    List,
    /// Look up a booking by confirmation code
    Find { code: String },
    /// Cancel a booking
    Cancel { id: String },
}

pub async fn run(command: Commands, client: &ApiClient) -> anyhow::Result<()> {
    match command {
        Commands::Register {
            name,
            email,
            password,
            phone,
        } => {
            let registration = Registration {
                name,
                email,
                password,
                phone_number: phone,
            };
            let response = client.register_user(&registration).await?;
            remember_session(client, &response)?;
            print_response(&response)
        }
        Commands::Login { email, password } => {
            let response = client.login_user(&LoginRequest { email, password }).await?;
            if !remember_session(client, &response)? {
                tracing::warn!("Login response carried no token; session unchanged");
            }
            print_response(&response)
        }
        Commands::Logout => {
            client.logout();
            println!("✓ Logged out");
            Ok(())
        }
        Commands::Status => handle_status(client),
        Commands::Hello => {
            println!("{}", client.hello().await?);
            Ok(())
        }
        Commands::Users(cmd) => {
            let response = match cmd {
                UserCommands::List => client.get_all_users().await?,
                UserCommands::Profile => client.get_user_profile().await?,
                UserCommands::Get { id } => client.get_user(&id).await?,
                UserCommands::Bookings { id } => client.get_user_bookings(&id).await?,
                UserCommands::Delete { id } => client.delete_user(&id).await?,
            };
            print_response(&response)
        }
        Commands::Rooms(cmd) => {
            let response = match cmd {
                RoomCommands::Available => client.get_all_available_rooms().await?,
                RoomCommands::Search {
                    check_in,
                    check_out,
                    room_type,
                } => {
                    client
                        .get_available_rooms_by_date_and_type(check_in, check_out, &room_type)
                        .await?
                }
                RoomCommands::Types => client.get_room_types().await?,
                RoomCommands::List => client.get_all_rooms().await?,
                RoomCommands::Get { id } => client.get_room_by_id(&id).await?,
                RoomCommands::Add(fields) => client.add_room(room_form(fields).await?).await?,
                RoomCommands::Update { id, fields } => {
                    client.update_room(&id, room_form(fields).await?).await?
                }
                RoomCommands::Delete { id } => client.delete_room(&id).await?,
            };
            print_response(&response)
        }
        Commands::Bookings(cmd) => {
            let response = match cmd {
                BookingCommands::Book {
                    room_id,
                    user_id,
                    check_in,
                    check_out,
                    adults,
                    children,
                } => {
                    let booking = BookingRequest {
                        check_in_date: check_in,
                        check_out_date: check_out,
                        num_of_adults: adults,
                        num_of_children: children,
                    };
                    client.book_room(&room_id, &user_id, &booking).await?
                }
                BookingCommands::List => client.get_all_bookings().await?,
                BookingCommands::Find { code } => client.get_booking_by_confirmation_code(&code).await?,
                BookingCommands::Cancel { id } => client.cancel_booking(&id).await?,
            };
            print_response(&response)
        }
        Commands::Open { path } => {
            let session = current_session(client);
            println!("{}", Shell::default().render(&path, &session));
            Ok(())
        }
    }
}

/// Saves the token and role from an auth response. Returns whether one was present.
fn remember_session(client: &ApiClient, response: &ApiResponse) -> anyhow::Result<bool> {
    let Some(session) = Session::from_auth_response(response) else {
        return Ok(false);
    };

    client
        .session_store()
        .save(&session)
        .context("Failed to persist session")?;

    match session.role {
        Some(role) => tracing::info!("Signed in with role {}", role),
        None => tracing::info!("Signed in"),
    }
    Ok(true)
}

/// The stored session; unreadable state renders as signed out.
fn current_session(client: &ApiClient) -> Session {
    client.session_store().load().unwrap_or_else(|e| {
        tracing::warn!("Failed to read session, treating as signed out: {}", e);
        Session::default()
    })
}

fn handle_status(client: &ApiClient) -> anyhow::Result<()> {
    println!("Backend: {}", client.base_url());
    if !client.is_authenticated() {
        println!("Not signed in");
        return Ok(());
    }

    let role = if client.is_admin() {
        "ADMIN"
    } else if client.is_user() {
        "USER"
    } else {
        "unknown"
    };
    println!("✓ Signed in (role: {})", role);
    Ok(())
}

async fn room_form(fields: RoomFields) -> anyhow::Result<RoomForm> {
    let mut form = RoomForm::new();
    if let Some(room_type) = fields.room_type {
        form = form.text("roomType", room_type);
    }
    if let Some(price) = fields.price {
        form = form.text("roomPrice", price);
    }
    if let Some(description) = fields.description {
        form = form.text("roomDescription", description);
    }
    if let Some(path) = fields.photo {
        let bytes = tokio::fs::read(&path)
            .await
            .with_context(|| format!("Failed to read photo {}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "photo".to_string());
        form = form.file("photo", file_name, guess_mime(&path), bytes);
    }
    Ok(form)
}

fn guess_mime(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

fn print_response(response: &ApiResponse) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(response)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{FileStore, Role, SessionStore};
    use mockito::{Matcher, Server};
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    fn file_client(url: &str, dir: &TempDir) -> (ApiClient, Arc<FileStore>) {
        let store = Arc::new(FileStore::new(dir.path().join("session.json")));
        let client = ApiClient::new(url, Duration::from_secs(5), store.clone()).unwrap();
        (client, store)
    }

    fn login(email: &str) -> Commands {
        Commands::Login {
            email: email.to_string(),
            password: "secret".to_string(),
        }
    }

    #[tokio::test]
    async fn test_login_persists_token_and_role() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/auth/login")
            .match_body(Matcher::PartialJson(serde_json::json!({"email": "admin@example.test"})))
            .with_status(200)
            .with_body(r#"{"statusCode":200,"token":"jwt","role":"ADMIN"}"#)
            .create_async()
            .await;

        let dir = TempDir::new().unwrap();
        let (client, store) = file_client(&server.url(), &dir);
        run(login("admin@example.test"), &client).await.unwrap();

        mock.assert_async().await;
        assert_eq!(store.load().unwrap(), Session::new("jwt", Some(Role::Admin)));
        assert!(client.is_admin());
    }

    #[tokio::test]
    async fn test_login_without_token_leaves_session_unchanged() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/auth/login")
            .with_status(200)
            .with_body(r#"{"statusCode":200,"message":"successful"}"#)
            .create_async()
            .await;

        let dir = TempDir::new().unwrap();
        let (client, store) = file_client(&server.url(), &dir);
        let previous = Session::new("earlier-token", Some(Role::User));
        store.save(&previous).unwrap();

        run(login("guest@example.test"), &client).await.unwrap();
        assert_eq!(store.load().unwrap(), previous);
    }

    #[tokio::test]
    async fn test_failed_login_is_an_error_and_persists_nothing() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/auth/login")
            .with_status(401)
            .with_body(r#"{"statusCode":401,"message":"Bad credentials"}"#)
            .create_async()
            .await;

        let dir = TempDir::new().unwrap();
        let (client, store) = file_client(&server.url(), &dir);
        assert!(run(login("guest@example.test"), &client).await.is_err());
        assert_eq!(store.load().unwrap(), Session::default());
    }

    #[tokio::test]
    async fn test_register_persists_token_when_returned() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/auth/register")
            .with_status(200)
            .with_body(r#"{"statusCode":200,"token":"fresh","role":"USER"}"#)
            .create_async()
            .await;

        let dir = TempDir::new().unwrap();
        let (client, store) = file_client(&server.url(), &dir);
        let command = Commands::Register {
            name: "Ada".to_string(),
            email: "ada@example.test".to_string(),
            password: "pw".to_string(),
            phone: "0771234567".to_string(),
        };
        run(command, &client).await.unwrap();

        assert_eq!(store.load().unwrap(), Session::new("fresh", Some(Role::User)));
    }

    #[tokio::test]
    async fn test_open_with_corrupt_session_renders_signed_out() {
        let dir = TempDir::new().unwrap();
        let (client, store) = file_client("https://api.example.test", &dir);
        std::fs::write(store.path(), "{ broken").unwrap();

        assert_eq!(current_session(&client), Session::default());
        let command = Commands::Open {
            path: "/home".to_string(),
        };
        run(command, &client).await.unwrap();
    }

    #[test]
    fn test_guess_mime() {
        assert_eq!(guess_mime(Path::new("suite.PNG")), "image/png");
        assert_eq!(guess_mime(Path::new("suite.jpeg")), "image/jpeg");
        assert_eq!(guess_mime(Path::new("suite")), "application/octet-stream");
    }

    #[test]
    fn test_parse_room_search() {
        let cli = Cli::try_parse_from([
            "zikhron",
            "rooms",
            "search",
            "--check-in",
            "2024-07-01",
            "--check-out",
            "2024-07-03",
            "--room-type",
            "Suite",
        ])
        .unwrap();

        match cli.command {
            Commands::Rooms(RoomCommands::Search { check_in, room_type, .. }) => {
                assert_eq!(check_in, NaiveDate::from_ymd_opt(2024, 7, 1).unwrap());
                assert_eq!(room_type, "Suite");
            }
            _ => panic!("expected rooms search"),
        }
    }

    #[test]
    fn test_parse_rejects_bad_date() {
        let result = Cli::try_parse_from([
            "zikhron", "bookings", "book", "1", "2", "--check-in", "tomorrow", "--check-out",
            "2024-07-03",
        ]);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_room_form_only_includes_given_fields() {
        let form = room_form(RoomFields {
            room_type: Some("Suite".to_string()),
            price: None,
            description: Some("Sea view".to_string()),
            photo: None,
        })
        .await
        .unwrap();
        assert_eq!(form.len(), 2);
    }
}
