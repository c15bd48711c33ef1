//! Server-rendered client shell. Presentational only; the pages talk to the
//! JSON API from the browser.

use axum::http::StatusCode;
use axum::response::Html;

pub async fn home() -> Html<String> {
    Html(layout(
        "Home",
        r#"<h1>agora</h1>
<p>Follow people and read their posts in one timeline.</p>
<p><a href="/user-access/login">Log in</a></p>"#,
    ))
}

pub async fn user_access() -> Html<String> {
    Html(layout(
        "Log in",
        r#"<h1>Log in</h1>
<form id="login">
  <label>Email <input type="email" name="email" required></label>
  <label>Password <input type="password" name="password" required></label>
  <button type="submit">Log in</button>
</form>
<p id="login-status" role="status"></p>
<script>
document.getElementById("login").addEventListener("submit", async (event) => {
  event.preventDefault();
  const form = new FormData(event.target);
  const resp = await fetch("/v1/auth/login", {
    method: "POST",
    headers: { "content-type": "application/json" },
    body: JSON.stringify({ email: form.get("email"), password: form.get("password") }),
  });
  const body = await resp.json();
  const status = document.getElementById("login-status");
  if (resp.ok) {
    sessionStorage.setItem("accessToken", body.accessToken);
    status.textContent = "Logged in as " + body.user.name;
  } else {
    status.textContent = body.error;
  }
});
</script>"#,
    ))
}

pub async fn not_found() -> (StatusCode, Html<String>) {
    (
        StatusCode::NOT_FOUND,
        Html(layout(
            "Not found",
            r#"<h1>Page not found</h1>
<p><a href="/">Back home</a></p>"#,
        )),
    )
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!doctype html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title} | agora</title>\n</head>\n<body>\n<main>\n{body}\n</main>\n</body>\n</html>\n"
    )
}
