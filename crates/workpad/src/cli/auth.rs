//! Account commands: signup, login, logout, whoami.

use futures_lite::future::block_on;

use workpad_core::error::Result;
use workpad_core::identity::IdentityProvider;

use super::AppContext;

pub fn signup(ctx: &mut AppContext, email: &str) -> Result<()> {
    let user = block_on(ctx.identity.signup(email))?;
    ctx.config.set_session(&user);
    ctx.config.save()?;
    block_on(ctx.store.set_identity(Some(user.clone())));
    println!("Signed up and logged in as {}", user.email);
    Ok(())
}

pub fn login(ctx: &mut AppContext, email: &str) -> Result<()> {
    let user = block_on(ctx.identity.login(email))?;
    ctx.config.set_session(&user);
    ctx.config.save()?;
    block_on(ctx.store.set_identity(Some(user.clone())));
    println!("Logged in as {}", user.email);
    Ok(())
}

pub fn logout(ctx: &mut AppContext) -> Result<()> {
    block_on(ctx.identity.logout())?;
    ctx.config.clear_session();
    ctx.config.save()?;
    block_on(ctx.store.set_identity(None));
    println!("Logged out");
    Ok(())
}

pub fn whoami(ctx: &AppContext) -> Result<()> {
    match ctx.identity.current_user() {
        Some(user) => println!("{} ({})", user.email, user.id),
        None => println!("Not logged in"),
    }
    Ok(())
}
