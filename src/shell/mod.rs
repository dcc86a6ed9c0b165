pub mod chrome;

pub use chrome::Shell;

use crate::session::Session;

pub const LOGIN_PATH: &str = "/login";

/// Who may open a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    Public,
    /// Any signed-in user.
    Protected,
    Admin,
}

impl Guard {
    pub fn admits(&self, session: &Session) -> bool {
        match self {
            Guard::Public => true,
            Guard::Protected => session.is_authenticated(),
            Guard::Admin => session.is_admin(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub title: String,
    pub body: String,
}

impl Page {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Page {
            title: title.into(),
            body: body.into(),
        }
    }

    pub fn home() -> Self {
        Page::new(
            "Welcome to Zikhron Hotel",
            "Get away from the daily stress and enjoy a stay with us.\n\
             Search available rooms by date and type, or look up a booking\n\
             with its confirmation code.",
        )
    }
}

#[derive(Debug, Clone)]
pub struct Route {
    pub path: String,
    pub guard: Guard,
    pub page: Page,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Render(Page),
    Redirect(&'static str),
    NotFound,
}

/// Exact-path route table.
#[derive(Debug, Clone, Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// The application's route table: only the public home page is mounted.
    pub fn app() -> Self {
        Router::new().route("/home", Guard::Public, Page::home())
    }

    pub fn route(mut self, path: impl Into<String>, guard: Guard, page: Page) -> Self {
        self.routes.push(Route {
            path: path.into(),
            guard,
            page,
        });
        self
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn resolve(&self, path: &str, session: &Session) -> Resolution {
        let path = normalize(path);
        let Some(route) = self.routes.iter().find(|r| r.path == path) else {
            tracing::debug!("No route for {}", path);
            return Resolution::NotFound;
        };

        if route.guard.admits(session) {
            Resolution::Render(route.page.clone())
        } else {
            tracing::debug!("{:?} guard rejected {}", route.guard, path);
            Resolution::Redirect(LOGIN_PATH)
        }
    }
}

fn normalize(path: &str) -> &str {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    }
}
