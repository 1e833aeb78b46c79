//! Sign-in and sign-up pages.

use std::fmt::Write;

use super::{error_banner, escape, layout};
use crate::models::Identity;

/// Values echoed back into a re-rendered form.
#[derive(Debug, Default)]
pub struct FormEcho<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub error: Option<&'a str>,
}

/// Sign-in page. `google` shows the federated sign-in link.
pub fn login(identity: Option<&Identity>, echo: &FormEcho<'_>, google: bool) -> String {
    let mut body = String::with_capacity(4096);
    let _ = write!(
        body,
        r#"<section class="auth">
<div class="center"><span class="badge">Welcome Back</span>
<h2>Welcome Back</h2>
<p class="muted">Sign in to access TCC Detection &amp; Tracking Tools</p></div>
{error}
<form method="post" action="/login" class="card">
<label for="email">Email Address</label>
<input id="email" name="email" type="email" value="{email}" placeholder="you@example.com" required>
<label for="password">Password</label>
<input id="password" name="password" type="password" placeholder="••••••••" required>
<button type="submit" class="btn">Sign In</button>
</form>
{google}
<p class="center muted">Don&#39;t have an account? <a href="/signup" class="brand">Sign up</a></p>
</section>"#,
        error = error_banner(echo.error),
        email = escape(echo.email),
        google = google_block(google, "login", "Continue with Google"),
    );
    layout("Sign In", identity, &body)
}

/// Sign-up page.
pub fn signup(identity: Option<&Identity>, echo: &FormEcho<'_>, google: bool) -> String {
    let mut body = String::with_capacity(4096);
    let _ = write!(
        body,
        r#"<section class="auth">
<div class="center"><span class="badge">Create Account</span>
<h2>Get Started</h2>
<p class="muted">Create an account to access TCC Detection &amp; Tracking Tools</p></div>
{error}
<form method="post" action="/signup" class="card">
<label for="name">Full Name</label>
<input id="name" name="name" type="text" value="{name}" placeholder="John Doe">
<label for="email">Email Address</label>
<input id="email" name="email" type="email" value="{email}" placeholder="you@example.com" required>
<label for="password">Password</label>
<input id="password" name="password" type="password" minlength="6" placeholder="••••••••" required>
<p class="muted small">Must be at least 6 characters</p>
<label for="confirm_password">Confirm Password</label>
<input id="confirm_password" name="confirm_password" type="password" minlength="6" placeholder="••••••••" required>
<button type="submit" class="btn">Create Account</button>
</form>
{google}
<p class="center muted">Already have an account? <a href="/login" class="brand">Sign in</a></p>
</section>"#,
        error = error_banner(echo.error),
        name = escape(echo.name),
        email = escape(echo.email),
        google = google_block(google, "signup", "Sign up with Google"),
    );
    layout("Sign Up", identity, &body)
}

fn google_block(enabled: bool, from: &str, label: &str) -> String {
    if !enabled {
        return String::new();
    }
    format!(
        r#"<p class="divider">Or continue with</p>
<a href="/auth/google?from={}" class="btn ghost center" style="display:block">{}</a>"#,
        from,
        escape(label)
    )
}
