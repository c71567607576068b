use anyhow::{Context, Result};
use sportcal_core::{
    db::set_auth_token, models::GUEST_TOKEN, ComposedFilterStore, PreferencesStore,
};
use tracing::warn;

use super::Session;
use crate::{args::LoginArgs, web_client::WebClient};

pub async fn login_cmd(session: &Session, args: LoginArgs) -> Result<()> {
    let response = if args.register {
        session
            .client
            .register(&args.login, &args.password)
            .await
            .context("Registration failed")?
    } else {
        session
            .client
            .login(&args.login, &args.password)
            .await
            .context("Login failed")?
    };

    set_auth_token(&session.prefs, Some(response.token.clone()), Some(response.id))?;
    println!("Signed in as {}", args.login);

    // Presets belong to the account, pull them with the fresh token
    let client = WebClient::new(&session.config.api_base_url, Some(response.token))?
        .with_notifications_url(&session.config.notifications_base_url);
    let store = ComposedFilterStore::new(&client, &session.prefs);
    match store.load_remote().await {
        Ok(_) => {
            let count = session.prefs.read()?.composed_filters.len();
            println!("{} presets loaded", count);
        }
        Err(e) => {
            warn!(error = %e, "Presets not loaded after sign-in");
            eprintln!("Could not load presets: {}. Run `sportcal preset sync` to retry.", e);
        }
    }

    Ok(())
}

pub fn guest_cmd(session: &Session) -> Result<()> {
    set_auth_token(&session.prefs, Some(GUEST_TOKEN.to_string()), None)?;
    println!("Continuing as guest; sign in to save presets");

    Ok(())
}

/// Drops the token and everything that belonged to the account
pub fn logout_cmd(session: &Session) -> Result<()> {
    session.prefs.write(|prefs| {
        prefs.auth_token = None;
        prefs.user_id = None;
        prefs.composed_filters.clear();
        prefs.default_filter_id = None;
    })?;
    println!("Signed out");

    Ok(())
}
