use axum::{
    extract::{rejection::FormRejection, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension, Form,
};
use membership_auth::{hash_password, verify_password, LoginForm, SignupForm};
use membership_db::NewUser;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::WebError;
use crate::models::{ChangeRoleForm, CurrentSession, Identity};
use crate::views::View;
use crate::AppState;

/// Decoded pairs of a urlencoded form body, in submission order
type FormFields = Vec<(String, String)>;

/// `302 Found` to `location`
pub fn found(location: &'static str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}

/// `GET /`
pub async fn home(Extension(session): Extension<CurrentSession>) -> View {
    match session.identity() {
        Some(identity) => View::Home {
            name: identity.name.clone(),
        },
        None => View::Welcome,
    }
}

/// `GET /signup`
pub async fn signup_page() -> View {
    View::Signup {
        error_message: None,
    }
}

/// `POST /signupSubmit`
pub async fn signup_submit(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<CurrentSession>,
    form: Result<Form<FormFields>, FormRejection>,
) -> Result<Response, WebError> {
    let fields = submitted_fields(form);
    let account = match SignupForm::from_fields(&fields).into_account() {
        Ok(account) => account,
        Err(e) => return Ok(signup_error(e.to_string())),
    };

    // Not atomic with the insert below; concurrent signups can both pass
    if state.directory.find_by_email(&account.email).await?.is_some() {
        return Ok(signup_error("Email already exists"));
    }

    let password = account.password;
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password)).await??;

    let user = state
        .directory
        .insert(NewUser::member(account.name, account.email, password_hash))
        .await?;

    info!("User successfully created: {}", user.email);

    let cookie = state.sessions.start(&session, Identity::from(&user)).await?;

    Ok(([(header::SET_COOKIE, cookie)], found("/members")).into_response())
}

/// `GET /login`
pub async fn login_page() -> View {
    View::Login {
        error_message: None,
    }
}

/// `POST /loginSubmit`
pub async fn login_submit(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<CurrentSession>,
    form: Result<Form<FormFields>, FormRejection>,
) -> Result<Response, WebError> {
    let fields = submitted_fields(form);
    let credentials = match LoginForm::from_fields(&fields).into_credentials() {
        Ok(credentials) => credentials,
        Err(e) => return Ok(login_error(e.to_string())),
    };

    let matches = state
        .directory
        .find_all_by_email(&credentials.email)
        .await?;

    // Exactly one record must match
    let [user] = matches.as_slice() else {
        return Ok(login_error("User not found"));
    };

    let password = credentials.password;
    let stored_hash = user.password.clone();
    let valid =
        tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash)).await??;

    if !valid {
        return Ok(login_error("Incorrect Password"));
    }

    debug!("Correct password for {}", user.email);

    let cookie = state.sessions.start(&session, Identity::from(user)).await?;

    Ok(([(header::SET_COOKIE, cookie)], found("/members")).into_response())
}

/// `GET /members` (tier 1)
pub async fn members(Extension(identity): Extension<Identity>) -> View {
    View::Members {
        name: identity.name,
    }
}

/// `GET /admin` (tier 2)
pub async fn admin(State(state): State<Arc<AppState>>) -> Result<View, WebError> {
    let users = state.directory.list_all().await?;

    Ok(View::Admin {
        users,
        updated_user: None,
        new_role: None,
    })
}

/// `POST /changeRole` (tier 2)
///
/// The submitted role is stored as given, without checking it against the
/// known roles.
pub async fn change_role(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<Identity>,
    Form(form): Form<ChangeRoleForm>,
) -> Result<View, WebError> {
    let changed = state
        .directory
        .update_role(&form.email, &form.new_role)
        .await?;

    info!(
        "{} set role of {} to {:?} ({} record(s))",
        admin.email, form.email, form.new_role, changed
    );

    let users = state.directory.list_all().await?;
    let updated_user = state
        .directory
        .find_by_email(&form.email)
        .await?
        .map(|user| user.name);

    Ok(View::Admin {
        new_role: updated_user.as_ref().map(|_| form.new_role),
        users,
        updated_user,
    })
}

/// `GET /logout`
pub async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<CurrentSession>,
) -> Result<Response, WebError> {
    let cookie = state.sessions.end(&session).await?;

    Ok(([(header::SET_COOKIE, cookie)], View::LoggedOut).into_response())
}

/// Any path no route or static file matched
pub async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, View::NotFound).into_response()
}

/// A body that is not a urlencoded form counts as one with no fields
fn submitted_fields(form: Result<Form<FormFields>, FormRejection>) -> FormFields {
    match form {
        Ok(Form(fields)) => fields,
        Err(rejection) => {
            debug!("Ignoring undecodable form body: {}", rejection);
            Vec::new()
        }
    }
}

fn signup_error(message: impl Into<String>) -> Response {
    View::Signup {
        error_message: Some(message.into()),
    }
    .into_response()
}

fn login_error(message: impl Into<String>) -> Response {
    View::Login {
        error_message: Some(message.into()),
    }
    .into_response()
}
