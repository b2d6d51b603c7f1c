//! HTML views
//!
//! Each page is a [`View`] variant carrying exactly what it shows. All pages
//! share the same layout and navigation list, whatever the visitor's session.

use axum::response::{Html, IntoResponse, Response};
use membership_db::entities::user;

/// Entry in the shared navigation bar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavLink {
    pub name: &'static str,
    pub url: &'static str,
}

/// Navigation shown on every page, never filtered by role
pub const NAV_LINKS: [NavLink; 5] = [
    NavLink { name: "Home", url: "/" },
    NavLink { name: "Members", url: "/members" },
    NavLink { name: "Admin", url: "/admin" },
    NavLink { name: "404", url: "/404" },
    NavLink { name: "Log Out", url: "/logout" },
];

#[derive(Debug, Clone)]
pub enum View {
    /// Landing page for a logged-in visitor
    Home { name: String },
    /// Landing page for an anonymous visitor
    Welcome,
    Signup { error_message: Option<String> },
    Login { error_message: Option<String> },
    Members { name: String },
    Admin {
        users: Vec<user::Model>,
        /// Name of the user whose role was just changed
        updated_user: Option<String>,
        new_role: Option<String>,
    },
    NoAccess,
    LoggedOut,
    NotFound,
    /// Generic page for internal failures
    Failure,
}

impl View {
    pub fn title(&self) -> &'static str {
        match self {
            View::Home { .. } => "Home",
            View::Welcome => "Welcome",
            View::Signup { .. } => "Sign Up",
            View::Login { .. } => "Log In",
            View::Members { .. } => "Members Area",
            View::Admin { .. } => "Admin",
            View::NoAccess => "NO ACCESS",
            View::LoggedOut => "Log Out",
            View::NotFound => "404",
            View::Failure => "Error",
        }
    }

    pub fn render(&self) -> String {
        let body = match self {
            View::Home { name } => format!(
                "<h1>Hello, {}!</h1>\n<p><a href=\"/members\">Go to Members Area</a></p>\n\
                 <p><a href=\"/logout\">Log out</a></p>",
                escape(name)
            ),
            View::Welcome => "<h1>Welcome</h1>\n<p><a href=\"/signup\">Sign up</a></p>\n\
                 <p><a href=\"/login\">Log in</a></p>"
                .to_string(),
            View::Signup { error_message } => format!(
                "<h1>Create user</h1>\n{}<form action=\"/signupSubmit\" method=\"post\">\n\
                 <input name=\"name\" type=\"text\" placeholder=\"name\">\n\
                 <input name=\"email\" type=\"email\" placeholder=\"email\">\n\
                 <input name=\"password\" type=\"password\" placeholder=\"password\">\n\
                 <button>Submit</button>\n</form>",
                error_block(error_message.as_deref())
            ),
            View::Login { error_message } => format!(
                "<h1>Log in</h1>\n{}<form action=\"/loginSubmit\" method=\"post\">\n\
                 <input name=\"email\" type=\"email\" placeholder=\"email\">\n\
                 <input name=\"password\" type=\"password\" placeholder=\"password\">\n\
                 <button>Submit</button>\n</form>",
                error_block(error_message.as_deref())
            ),
            View::Members { name } => format!(
                "<h1>Hello, {}.</h1>\n<p>Welcome to the members area.</p>",
                escape(name)
            ),
            View::Admin {
                users,
                updated_user,
                new_role,
            } => admin_body(users, updated_user.as_deref(), new_role.as_deref()),
            View::NoAccess => "<h1>NO ACCESS</h1>\n<p>You are not authorized to view this page.</p>"
                .to_string(),
            View::LoggedOut => "<h1>You are logged out.</h1>\n<p><a href=\"/\">Home</a></p>"
                .to_string(),
            View::NotFound => "<h1>Page not found - 404</h1>".to_string(),
            View::Failure => "<h1>Something went wrong</h1>\n<p>Please try again later.</p>"
                .to_string(),
        };

        layout(self.title(), &body)
    }
}

impl IntoResponse for View {
    fn into_response(self) -> Response {
        Html(self.render()).into_response()
    }
}

fn layout(title: &str, body: &str) -> String {
    let mut nav = String::new();
    for link in NAV_LINKS {
        nav.push_str(&format!("<li><a href=\"{}\">{}</a></li>", link.url, link.name));
    }

    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{}</title>\n<link rel=\"stylesheet\" href=\"/css/style.css\">\n</head>\n<body>\n\
         <nav><ul>{}</ul></nav>\n<main>\n{}\n</main>\n</body>\n</html>\n",
        escape(title),
        nav,
        body
    )
}

fn error_block(message: Option<&str>) -> String {
    match message {
        Some(message) => format!("<p class=\"error\">{}</p>\n", escape(message)),
        None => String::new(),
    }
}

fn admin_body(users: &[user::Model], updated_user: Option<&str>, new_role: Option<&str>) -> String {
    let mut body = String::from("<h1>Admin</h1>\n");

    if let (Some(name), Some(role)) = (updated_user, new_role) {
        body.push_str(&format!(
            "<p class=\"notice\">{} is now {}.</p>\n",
            escape(name),
            escape(role)
        ));
    }

    body.push_str("<table>\n<tr><th>Name</th><th>Email</th><th>Role</th><th>Change role</th></tr>\n");
    for user in users {
        body.push_str(&format!(
            "<tr><td>{name}</td><td>{email}</td><td>{role}</td><td>\
             <form action=\"/changeRole\" method=\"post\">\
             <input type=\"hidden\" name=\"email\" value=\"{email}\">\
             <select name=\"newRole\"><option value=\"member\">member</option>\
             <option value=\"admin\">admin</option></select>\
             <button>Update</button></form></td></tr>\n",
            name = escape(&user.name),
            email = escape(&user.email),
            role = escape(&user.user_type),
        ));
    }
    body.push_str("</table>");

    body
}

/// Escape text for HTML element content and double-quoted attributes
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn user(name: &str, email: &str, role: &str) -> user::Model {
        user::Model {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            password: "hash".to_string(),
            user_type: role.to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_every_view_has_full_nav() {
        let views = [
            View::Home {
                name: "Ann".to_string(),
            },
            View::Welcome,
            View::Signup {
                error_message: None,
            },
            View::NoAccess,
            View::LoggedOut,
            View::NotFound,
        ];

        for view in views {
            let html = view.render();
            for link in NAV_LINKS {
                assert!(
                    html.contains(&format!("<a href=\"{}\">{}</a>", link.url, link.name)),
                    "{} missing {} link",
                    view.title(),
                    link.name
                );
            }
        }
    }

    #[test]
    fn test_title_in_head() {
        let html = View::Members {
            name: "Ann".to_string(),
        }
        .render();
        assert!(html.contains("<title>Members Area</title>"));
        assert!(html.contains("Hello, Ann."));
    }

    #[test]
    fn test_error_message_shown_only_when_present() {
        let with_error = View::Login {
            error_message: Some("Incorrect Password".to_string()),
        }
        .render();
        assert!(with_error.contains("<p class=\"error\">Incorrect Password</p>"));

        let without = View::Login {
            error_message: None,
        }
        .render();
        assert!(!without.contains("class=\"error\""));
    }

    #[test]
    fn test_user_text_is_escaped() {
        let html = View::Signup {
            error_message: Some("\"name\" must only contain <b>".to_string()),
        }
        .render();
        assert!(html.contains("&quot;name&quot; must only contain &lt;b&gt;"));
        assert!(!html.contains("<b>"));
    }

    #[test]
    fn test_admin_lists_users_and_confirmation() {
        let html = View::Admin {
            users: vec![
                user("Ann", "ann@x.com", "admin"),
                user("Bob", "bob@x.com", "superuser"),
            ],
            updated_user: Some("Bob".to_string()),
            new_role: Some("superuser".to_string()),
        }
        .render();

        assert!(html.contains("<td>Ann</td><td>ann@x.com</td><td>admin</td>"));
        assert!(html.contains("<td>Bob</td><td>bob@x.com</td><td>superuser</td>"));
        assert!(html.contains("Bob is now superuser."));
        assert!(!html.contains("hash"));
    }

    #[test]
    fn test_admin_rows_each_on_own_line() {
        let html = View::Admin {
            users: vec![
                user("Ann", "ann@x.com", "admin"),
                user("Bob", "bob@x.com", "member"),
            ],
            updated_user: Some("Ann".to_string()),
            new_role: Some("admin".to_string()),
        }
        .render();

        assert!(html.contains("<p class=\"notice\">Ann is now admin.</p>\n<table>"));
        let rows: Vec<&str> = html.lines().filter(|l| l.starts_with("<tr><td>")).collect();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].ends_with("</tr>"));
        assert!(rows[1].contains("<td>Bob</td>"));
        assert!(html.contains("</tr>\n</table>"));
    }

    #[test]
    fn test_admin_without_change_has_no_notice() {
        let html = View::Admin {
            users: vec![user("Ann", "ann@x.com", "admin")],
            updated_user: None,
            new_role: None,
        }
        .render();
        assert!(!html.contains("class=\"notice\""));
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("a&b<c>\"d'"), "a&amp;b&lt;c&gt;&quot;d&#39;");
        assert_eq!(escape("Ann"), "Ann");
    }
}
