use super::handlers::{auth, feed, health, recipes, users};
use utoipa::openapi::{Contact, InfoBuilder, License, OpenApiBuilder, Tag};
use utoipa_axum::{router::OpenApiRouter, routes};

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    // Reuse the same router wiring and only return the generated OpenAPI spec.
    let (_router, openapi) = api_router().split_for_parts();
    openapi
}

/// Build the router that also drives the `OpenAPI` document.
///
/// Add new endpoints here via `.routes(routes!(...))` so they are both served
/// and included in the generated `OpenAPI` spec.
/// Routes added outside (like `/` or `OPTIONS /health`) are intentionally not documented.
pub(crate) fn api_router() -> OpenApiRouter {
    // `routes!` reads #[utoipa::path] to bind HTTP method + path and add the route to OpenAPI.
    let mut router = OpenApiRouter::with_openapi(cargo_openapi())
        .routes(routes!(health::health))
        .routes(routes!(auth::register::register))
        .routes(routes!(auth::login::login))
        .routes(routes!(auth::session::logout))
        .routes(routes!(auth::session::get_session))
        .routes(routes!(auth::otp::send))
        .routes(routes!(auth::otp::verify))
        .routes(routes!(auth::password::reset))
        .routes(routes!(auth::password::set))
        .routes(routes!(auth::password::check_information))
        .routes(routes!(auth::security_questions::set))
        .routes(routes!(auth::security_questions::get))
        .routes(routes!(auth::security_questions::check))
        .routes(routes!(users::data))
        .routes(routes!(users::all))
        .routes(routes!(users::by_ids))
        .routes(routes!(users::by_id))
        .routes(routes!(users::delete))
        .routes(routes!(users::follow))
        .routes(routes!(users::update_profile))
        .routes(routes!(users::set_picture))
        .routes(routes!(users::remove_picture))
        .routes(routes!(recipes::create))
        .routes(routes!(recipes::delete))
        .routes(routes!(recipes::all))
        .routes(routes!(recipes::by_ids))
        .routes(routes!(recipes::by_id))
        .routes(routes!(recipes::comment))
        .routes(routes!(recipes::favourite))
        .routes(routes!(recipes::like_content))
        .routes(routes!(recipes::reply_to_content))
        .routes(routes!(feed::posts))
        .routes(routes!(feed::by_ids))
        .routes(routes!(feed::create_post))
        .routes(routes!(feed::like))
        .routes(routes!(feed::comment))
        .routes(routes!(feed::favourite))
        .routes(routes!(feed::hide));

    let mut auth_tag = Tag::new("auth");
    auth_tag.description = Some("Accounts, sessions, and OTP verification".to_string());

    let mut user_tag = Tag::new("user");
    user_tag.description = Some("Profiles and the follow graph".to_string());

    let mut recipe_tag = Tag::new("recipe");
    recipe_tag.description = Some("The recipe catalog and its discussions".to_string());

    let mut feed_tag = Tag::new("feed");
    feed_tag.description = Some("The news feed".to_string());

    router.get_openapi_mut().tags = Some(vec![auth_tag, user_tag, recipe_tag, feed_tag]);

    router
}

fn cargo_openapi() -> utoipa::openapi::OpenApi {
    // Use Cargo.toml metadata instead of the utoipa-axum crate info defaults.
    let mut info = InfoBuilder::new()
        .title(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .description(optional_str(env!("CARGO_PKG_DESCRIPTION")))
        .build();

    info.contact = cargo_contact();
    info.license = cargo_license();

    OpenApiBuilder::new().info(info).build()
}

fn cargo_contact() -> Option<Contact> {
    // Cargo authors are `;` separated and may include "Name <email>".
    let authors = env!("CARGO_PKG_AUTHORS");
    let primary = authors.split(';').next().map(str::trim)?;
    if primary.is_empty() {
        return None;
    }

    let (name, email) = parse_author(primary);
    if name.is_none() && email.is_none() {
        return None;
    }

    let mut contact = Contact::new();
    contact.name = name.map(str::to_string);
    contact.email = email.map(str::to_string);
    Some(contact)
}

fn cargo_license() -> Option<License> {
    let identifier = optional_str(env!("CARGO_PKG_LICENSE"))?;
    let mut license = License::new(identifier);
    license.identifier = Some(identifier.to_string());
    Some(license)
}

fn optional_str(value: &'static str) -> Option<&'static str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

fn parse_author(author: &str) -> (Option<&str>, Option<&str>) {
    if let Some(start) = author.find('<') {
        let name = author[..start].trim();
        let email = author[start + 1..].trim_end_matches('>').trim();
        let name = if name.is_empty() { None } else { Some(name) };
        let email = if email.is_empty() { None } else { Some(email) };
        (name, email)
    } else {
        let name = author.trim();
        (if name.is_empty() { None } else { Some(name) }, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_info_from_cargo() {
        let spec = openapi();
        assert_eq!(spec.info.title, env!("CARGO_PKG_NAME"));
        assert_eq!(spec.info.version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn openapi_documents_the_otp_endpoints() {
        let spec = openapi();
        let paths = &spec.paths.paths;
        assert!(paths.contains_key("/auth/otp/send/{purpose}"));
        assert!(paths.contains_key("/auth/otp/verify/{purpose}"));
        assert!(paths.contains_key("/auth/register"));
        assert!(paths.contains_key("/feed/posts/{feed_type}"));
    }

    #[test]
    fn parse_author_handles_name_and_email() {
        assert_eq!(
            parse_author("Team Crunchy <team@crunchy.dev>"),
            (Some("Team Crunchy"), Some("team@crunchy.dev"))
        );
        assert_eq!(parse_author("Team Crunchy"), (Some("Team Crunchy"), None));
    }
}
