use chrono::{Datelike, Local};

use super::{Resolution, Router};
use crate::session::Session;

const BRAND: &str = "Zikhron Hotel";

/// Links shown in the navigation bar for the given session.
pub fn nav_links(session: &Session) -> Vec<(&'static str, &'static str)> {
    let mut links = vec![
        ("Home", "/home"),
        ("Rooms", "/rooms"),
        ("Find my Booking", "/find-booking"),
    ];

    if session.is_user() {
        links.push(("Profile", "/profile"));
    }
    if session.is_admin() {
        links.push(("Admin", "/admin"));
    }

    if session.is_authenticated() {
        links.push(("Logout", "/logout"));
    } else {
        links.push(("Login", "/login"));
        links.push(("Register", "/register"));
    }

    links
}

pub fn navbar(session: &Session) -> String {
    let links = nav_links(session)
        .into_iter()
        .map(|(label, _)| label)
        .collect::<Vec<_>>()
        .join(" | ");
    format!("{}  [ {} ]", BRAND, links)
}

pub fn footer(year: i32) -> String {
    format!("{} | All Rights Reserved \u{00a9} {}", BRAND, year)
}

/// Navigation bar, routed content and footer around a router.
#[derive(Debug, Clone)]
pub struct Shell {
    router: Router,
}

impl Default for Shell {
    fn default() -> Self {
        Shell::new(Router::app())
    }
}

impl Shell {
    pub fn new(router: Router) -> Self {
        Shell { router }
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn render(&self, path: &str, session: &Session) -> String {
        self.render_with_year(path, session, Local::now().year())
    }

    pub fn render_with_year(&self, path: &str, session: &Session, year: i32) -> String {
        let content = match self.router.resolve(path, session) {
            Resolution::Render(page) => format!("{}\n\n{}", page.title, page.body),
            Resolution::Redirect(target) => format!("Redirecting to {}", target),
            Resolution::NotFound => format!("Page not found: {}", path),
        };

        let rule = "-".repeat(60);
        format!(
            "{}\n{}\n{}\n{}\n{}",
            navbar(session),
            rule,
            content,
            rule,
            footer(year)
        )
    }
}
