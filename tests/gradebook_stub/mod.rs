use std::io::Read as _;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

pub const STUB_EMAIL: &str = "student@example.edu";
pub const STUB_PASSWORD: &str = "hunter2";
const STUB_TOKEN: &str = "stub-token-123";
const SESSION_COOKIE: &str = "_gradebook_session=ok";

#[allow(dead_code)]
#[derive(Debug, Clone, Default)]
pub struct GradebookStubConfig {
    /// Link a course whose page answers with HTTP 500.
    pub broken_course: bool,
    /// Link a course whose page answers after this delay.
    pub slow_course: Option<Duration>,
}

#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
    pub body: String,
}

pub struct GradebookStub {
    pub base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    shutdown_tx: Option<mpsc::Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

#[allow(dead_code)]
impl GradebookStub {
    pub fn spawn(config: GradebookStubConfig) -> Self {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("start gradebook stub server");
        let addr = server.server_addr();
        let base_url = format!("http://{addr}");

        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&requests);
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let handle = thread::spawn(move || {
            loop {
                if shutdown_rx.try_recv().is_ok() {
                    break;
                }

                let mut request = match server.recv_timeout(Duration::from_millis(50)) {
                    Ok(Some(req)) => req,
                    Ok(None) => continue,
                    Err(_) => break,
                };

                let mut body = String::new();
                let _ = request.as_reader().read_to_string(&mut body);

                let header = |name: &'static str| {
                    request
                        .headers()
                        .iter()
                        .find(|h| h.field.equiv(name))
                        .map(|h| h.value.as_str().to_owned())
                };
                let user_agent = header("User-Agent");
                let referer = header("Referer");
                let logged_in = header("Cookie").is_some_and(|c| c.contains(SESSION_COOKIE));

                let method = request.method().to_string();
                let path = request.url().to_string();
                recorded
                    .lock()
                    .expect("lock recorded requests")
                    .push(RecordedRequest {
                        method: method.clone(),
                        path: path.clone(),
                        user_agent,
                        referer,
                        body: body.clone(),
                    });

                let response = match (method.as_str(), path.as_str()) {
                    ("GET", "/") => html(200, &landing_page()),
                    ("POST", "/login") => login(&body),
                    (_, _) if !logged_in => html(401, "<p>Please log in.</p>"),
                    ("GET", "/account") => html(200, &account_page(&config)),
                    ("GET", "/courses/1") => html(200, &cse100_page()),
                    ("GET", "/courses/2") => html(200, &math_page()),
                    ("GET", "/courses/3") => {
                        html(200, "<main><p>You are not enrolled in this course.</p></main>")
                    }
                    ("GET", "/courses/500") => html(500, "<p>Internal Server Error</p>"),
                    ("GET", "/courses/7") => {
                        if let Some(delay) = config.slow_course {
                            thread::sleep(delay);
                        }
                        html(200, &math_page())
                    }
                    _ => html(404, "<p>not found</p>"),
                };
                let _ = request.respond(response);
            }
        });

        Self {
            base_url,
            requests,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .expect("lock recorded requests")
            .clone()
    }
}

impl Drop for GradebookStub {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

type StubResponse = tiny_http::Response<std::io::Cursor<Vec<u8>>>;

fn html(status: u16, body: &str) -> StubResponse {
    let header = tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"text/html; charset=utf-8"[..])
        .expect("build header");
    tiny_http::Response::from_string(body)
        .with_status_code(status)
        .with_header(header)
}

fn login(body: &str) -> StubResponse {
    let expected = [
        format!("authenticity_token={STUB_TOKEN}"),
        "session%5Bemail%5D=student%40example.edu".to_owned(),
        format!("session%5Bpassword%5D={STUB_PASSWORD}"),
        "session%5Bremember_me%5D=0%2C1".to_owned(),
        "session%5Bremember_me_sso%5D=0".to_owned(),
    ];
    if !expected.iter().all(|field| body.contains(field.as_str())) {
        return html(401, "<p>Invalid email/password combination.</p>");
    }

    let location = tiny_http::Header::from_bytes(&b"Location"[..], &b"/account"[..])
        .expect("build header");
    let cookie = tiny_http::Header::from_bytes(
        &b"Set-Cookie"[..],
        format!("{SESSION_COOKIE}; Path=/; HttpOnly").as_bytes(),
    )
    .expect("build header");
    tiny_http::Response::from_string("")
        .with_status_code(302)
        .with_header(location)
        .with_header(cookie)
}

fn landing_page() -> String {
    format!(
        r#"<!doctype html>
<html><body>
  <form class="loginForm" action="/login" method="post">
    <input name="utf8" type="hidden" value="&#x2713;">
    <input type="hidden" name="authenticity_token" value="{STUB_TOKEN}">
    <input type="email" name="session[email]">
    <input type="password" name="session[password]">
  </form>
</body></html>"#
    )
}

fn account_page(config: &GradebookStubConfig) -> String {
    let broken = if config.broken_course {
        r#"<a class="courseBox" href="/courses/500"><h3>BROKEN 1</h3></a>"#
    } else {
        ""
    };
    let slow = if config.slow_course.is_some() {
        r#"<a class="courseBox" href="/courses/7"><h3>SLOW 1</h3></a>"#
    } else {
        ""
    };
    format!(
        r#"<!doctype html>
<html><body>
  <div class="courseList">
    <div class="courseList--term">
      Fall 2024
    </div>
    <div class="courseList--coursesForTerm">
      <a class="courseBox" href="/courses/1"><h3 class="courseBox--shortname">CSE 100</h3></a>
      <a class="courseBox" href="/courses/3"><h3 class="courseBox--shortname">CSE 199</h3></a>
      {broken}{slow}
    </div>
    <div class="courseList--term">Spring 2023</div>
    <div class="courseList--coursesForTerm">
      <a class="courseBox" href="/courses/2"><h3 class="courseBox--shortname">MATH 20A</h3></a>
      <a class="courseBox courseBox-new" href="">Add a course</a>
    </div>
  </div>
</body></html>"#
    )
}

fn cse100_page() -> String {
    r#"<!doctype html>
<html><body>
  <header class="courseHeader">
    <h1 class="courseHeader--title">CSE 100</h1>
    <h2 class="courseHeader--term">Fall 2024</h2>
  </header>
  <table class="table" id="assignments-student-table">
    <thead><tr role="row"><th>Name</th><th>Status</th><th>Released</th><th>Due</th></tr></thead>
    <tbody>
      <tr role="row">
        <th class="table--primaryLink"><a href="/courses/1/assignments/101/submissions/9001">Homework 1</a></th>
        <td><div class="submissionStatus--score">8.0 / 10.0</div></td>
        <td><time datetime="2024-09-30 09:00:00 -0700">Sep 30</time></td>
        <td><time datetime="2024-10-07 23:59:00 -0700">Oct 07</time></td>
      </tr>
      <tr role="row">
        <th class="table--primaryLink"><a href="/courses/1/assignments/102/submissions/9002">Midterm 1</a></th>
        <td><div class="submissionStatus--score">18.0 / 20.0</div></td>
      </tr>
      <tr role="row">
        <th class="table--primaryLink"><button class="js-submitAssignment" data-assignment-id="103">Homework 2</button></th>
        <td><div class="submissionStatus--text">No Submission</div></td>
      </tr>
      <tr role="row">
        <th class="table--primaryLink">Final Exam</th>
        <td><div class="submissionStatus--text">Submitted</div></td>
      </tr>
    </tbody>
  </table>
</body></html>"#
        .to_owned()
}

fn math_page() -> String {
    r#"<!doctype html>
<html><body>
  <header class="courseHeader">
    <h1>MATH 20A</h1>
    <h2 class="courseHeader--term">Spring 2023</h2>
  </header>
  <table class="table"><tbody></tbody></table>
</body></html>"#
        .to_owned()
}
