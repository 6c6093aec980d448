//! Scenario runs against an in-memory OpsDeck page
//!
//! `FakeOpsDeck` answers the app's API calls from the same fixture table the
//! runner fills, renders a small element tree for the current state and
//! resolves locators against it the way the in-page resolver does.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use tempfile::TempDir;

use uiscenario::browser::locator::Target;
use uiscenario::browser::{BrowserPage, Locator, Probe};
use uiscenario::common::config::Config;
use uiscenario::fixture::schema::{Me, Member, Ticket};
use uiscenario::fixture::FixtureTable;
use uiscenario::testing::{load_scenario, plan, run_with_page, RunOverrides, Scenario, ScenarioResult};
use uiscenario::{Error, Result};

const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";

#[derive(Debug, Clone, Copy, PartialEq)]
enum OnClick {
    Logout,
    OpenModal,
    CreateTicket,
    RoleMenu(usize),
}

#[derive(Debug, Clone)]
struct Element {
    tag: &'static str,
    role: Option<&'static str>,
    name: String,
    text: String,
    attrs: Vec<(&'static str, String)>,
    parent: Option<usize>,
    visible: bool,
    on_click: Option<OnClick>,
}

impl Element {
    fn new(tag: &'static str) -> Self {
        Self {
            tag,
            role: None,
            name: String::new(),
            text: String::new(),
            attrs: Vec::new(),
            parent: None,
            visible: true,
            on_click: None,
        }
    }

    fn button(name: &str) -> Self {
        let mut el = Self::new("button");
        el.role = Some("button");
        el.name = name.to_string();
        el.text = name.to_string();
        el
    }

    fn heading(tag: &'static str, text: &str) -> Self {
        let mut el = Self::new(tag).text(text);
        el.role = Some("heading");
        el.name = text.to_string();
        el
    }

    fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    fn attr(mut self, key: &'static str, value: &str) -> Self {
        self.attrs.push((key, value.to_string()));
        self
    }

    fn on(mut self, action: OnClick) -> Self {
        self.on_click = Some(action);
        self
    }
}

#[derive(Default)]
struct Tree(Vec<Element>);

impl Tree {
    fn add(&mut self, parent: Option<usize>, mut el: Element) -> usize {
        el.parent = parent;
        self.0.push(el);
        self.0.len() - 1
    }
}

/// One API call and the answer the page got
#[derive(Debug, Clone)]
struct Request {
    method: String,
    url: String,
    /// 0 when no fixture answered
    status: u16,
    body: Vec<u8>,
}

/// What the fake page did, readable after the page moved into the runner
#[derive(Debug, Default)]
struct PageLog {
    requests: Vec<Request>,
    scripts: Vec<String>,
    closed: bool,
}

impl PageLog {
    fn matching<'a>(
        &'a self,
        method: &'a str,
        url_suffix: &'a str,
    ) -> impl Iterator<Item = &'a Request> + 'a {
        self.requests
            .iter()
            .filter(move |r| r.method == method && r.url.ends_with(url_suffix))
    }

    fn count(&self, method: &str, url_suffix: &str) -> usize {
        self.matching(method, url_suffix).count()
    }
}

#[derive(Default)]
struct AppState {
    url: String,
    me: Option<Me>,
    tickets: Vec<Ticket>,
    members: Vec<Member>,
    modal_open: bool,
    values: BTreeMap<String, String>,
    toast: Option<String>,
    role_menu: Option<usize>,
}

struct FakeOpsDeck {
    table: Arc<FixtureTable>,
    log: Arc<Mutex<PageLog>>,
    state: AppState,
    /// Every probe hangs forever
    stall_probes: bool,
}

impl FakeOpsDeck {
    fn new(table: Arc<FixtureTable>) -> (Self, Arc<Mutex<PageLog>>) {
        let log = Arc::new(Mutex::new(PageLog::default()));
        let page = Self {
            table,
            log: Arc::clone(&log),
            state: AppState::default(),
            stall_probes: false,
        };
        (page, log)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.log.lock().closed {
            return Err(Error::SessionClosed);
        }
        Ok(())
    }

    fn origin_and_path(&self) -> (String, String) {
        match url::Url::parse(&self.state.url) {
            Ok(url) => (url.origin().ascii_serialization(), url.path().to_string()),
            Err(_) => (String::new(), String::new()),
        }
    }

    /// Send a request through the fixture table; no fixture means no backend
    fn request(&self, method: &str, path: &str) -> (u16, Vec<u8>) {
        let (origin, _) = self.origin_and_path();
        let url = format!("{}{}", origin, path);
        let (status, body) = match self.table.resolve(method, &url).response() {
            Some(response) => (
                response.status,
                response.body.to_bytes().unwrap_or_default(),
            ),
            None => (0, Vec::new()),
        };
        self.log.lock().requests.push(Request {
            method: method.to_string(),
            url,
            status,
            body: body.clone(),
        });
        (status, body)
    }

    fn fetch<T: DeserializeOwned>(&self, path: &str) -> Option<T> {
        let (status, body) = self.request("GET", path);
        if status != 200 {
            return None;
        }
        serde_json::from_slice(&body).ok()
    }

    fn org_id(&self) -> Option<String> {
        self.state
            .me
            .as_ref()
            .and_then(|me| me.organizations.first())
            .map(|org| org.id.clone())
    }

    fn team_page_org(&self) -> Option<String> {
        let (_, path) = self.origin_and_path();
        let rest = path.strip_prefix("/organizations/")?;
        let org = rest.strip_suffix("/settings/team")?;
        Some(org.to_string())
    }

    fn load_tickets(&mut self) {
        self.state.tickets = match self.org_id() {
            Some(org) => self
                .fetch(&format!("/api/tickets?organization_id={}", org))
                .unwrap_or_default(),
            None => Vec::new(),
        };
    }

    /// What the SPA does on every document load
    fn load_app(&mut self) {
        self.state.modal_open = false;
        self.state.toast = None;
        self.state.role_menu = None;
        self.state.values.clear();
        self.state.members.clear();

        self.state.me = self.fetch("/api/me");
        if self.state.me.is_none() {
            self.state.tickets.clear();
            return;
        }
        match self.team_page_org() {
            Some(org) => {
                self.state.members = self
                    .fetch(&format!("/api/organizations/{}/members", org))
                    .unwrap_or_default();
            }
            None => self.load_tickets(),
        }
    }

    fn render(&self) -> Vec<Element> {
        let mut tree = Tree::default();
        let me = match &self.state.me {
            Some(me) => me,
            None => {
                tree.add(None, Element::button("Login with Google"));
                return tree.0;
            }
        };

        let header = tree.add(None, Element::new("header"));
        tree.add(Some(header), Element::new("span").text("OpsDeck"));
        tree.add(Some(header), Element::new("span").text(&me.user.email));
        let menu = tree.add(Some(header), Element::button("Open user menu"));
        if let Some(avatar) = me.user.avatar_url.as_deref().filter(|a| !a.is_empty()) {
            tree.add(Some(menu), Element::new("img").attr("src", avatar));
        }
        tree.add(Some(header), Element::button("Logout").on(OnClick::Logout));

        if self.team_page_org().is_some() {
            tree.add(None, Element::heading("h1", "Team Members"));
            let list = tree.add(None, Element::new("ul"));
            for (i, member) in self.state.members.iter().enumerate() {
                let mut row = Element::new("li");
                row.role = Some("listitem");
                let row = tree.add(Some(list), row);
                tree.add(Some(row), Element::new("span").text(&member.name));
                if let Some(email) = &member.email {
                    tree.add(Some(row), Element::new("span").text(email));
                }
                tree.add(
                    Some(row),
                    Element::button(&member.role).on(OnClick::RoleMenu(i)),
                );
                if self.state.role_menu == Some(i) {
                    let mut menu = Element::new("div");
                    menu.role = Some("menu");
                    let menu = tree.add(Some(row), menu);
                    for role in ["Owner", "Admin", "Member"] {
                        if role.eq_ignore_ascii_case(&member.role) {
                            continue;
                        }
                        let mut item = Element::new("button").text(role);
                        item.role = Some("menuitem");
                        item.name = role.to_string();
                        tree.add(Some(menu), item);
                    }
                }
            }
        } else {
            tree.add(None, Element::button("New Ticket").on(OnClick::OpenModal));
            if self.state.tickets.is_empty() {
                let empty = tree.add(
                    None,
                    Element::new("div").attr("class", "flex flex-col items-center"),
                );
                tree.add(Some(empty), Element::heading("h3", "No tickets found"));
                tree.add(
                    Some(empty),
                    Element::button("New Ticket").on(OnClick::OpenModal),
                );
            } else {
                let list = tree.add(None, Element::new("ul"));
                for ticket in &self.state.tickets {
                    let mut row = Element::new("li").text(&ticket.title);
                    row.role = Some("listitem");
                    tree.add(Some(list), row);
                }
            }
        }

        if self.state.modal_open {
            let mut dialog = Element::new("div");
            dialog.role = Some("dialog");
            let dialog = tree.add(None, dialog);
            tree.add(Some(dialog), Element::heading("h2", "Create New Ticket"));
            tree.add(Some(dialog), Element::new("input").attr("name", "title"));
            tree.add(
                Some(dialog),
                Element::new("textarea").attr("name", "description"),
            );
            let mut file = Element::new("input").attr("type", "file");
            file.visible = false;
            tree.add(Some(dialog), file);
            tree.add(
                Some(dialog),
                Element::button("Create").on(OnClick::CreateTicket),
            );
        }

        if let Some(toast) = &self.state.toast {
            let mut status = Element::new("div").text(toast);
            status.role = Some("status");
            tree.add(None, status);
        }
        tree.0
    }

    fn matches(&self, locator: &Locator) -> (Vec<Element>, Vec<usize>) {
        let elements = self.render();
        let found = resolve(&elements, locator);
        (elements, found)
    }

    fn single(&self, locator: &Locator) -> Result<Element> {
        let (elements, found) = self.matches(locator);
        match found.as_slice() {
            [i] => Ok(elements[*i].clone()),
            _ => Err(Error::ElementNotFound {
                locator: locator.to_string(),
                count: found.len(),
            }),
        }
    }
}

fn resolve(elements: &[Element], locator: &Locator) -> Vec<usize> {
    let roots = locator.within.as_ref().map(|parent| resolve(elements, parent));
    let mut found: Vec<usize> = (0..elements.len())
        .filter(|&i| match &roots {
            Some(roots) => roots.iter().any(|&r| is_descendant(elements, i, r)),
            None => true,
        })
        .filter(|&i| target_matches(elements, i, locator))
        .filter(|&i| match &locator.has_text {
            Some(text) => subtree_text(elements, i).contains(text.as_str()),
            None => true,
        })
        .collect();

    if let Some(n) = locator.nth {
        let len = i32::try_from(found.len()).unwrap_or(i32::MAX);
        let index = if n < 0 { len + n } else { n };
        found = usize::try_from(index)
            .ok()
            .and_then(|i| found.get(i).copied())
            .into_iter()
            .collect();
    }
    found
}

fn is_descendant(elements: &[Element], mut i: usize, root: usize) -> bool {
    while let Some(parent) = elements[i].parent {
        if parent == root {
            return true;
        }
        i = parent;
    }
    false
}

fn subtree_text(elements: &[Element], root: usize) -> String {
    let mut text = elements[root].text.clone();
    for (i, el) in elements.iter().enumerate() {
        if is_descendant(elements, i, root) {
            text.push(' ');
            text.push_str(&el.text);
        }
    }
    text
}

fn text_matches(actual: &str, wanted: &str, exact: bool) -> bool {
    if exact {
        actual.trim() == wanted.trim()
    } else {
        !actual.is_empty() && actual.to_lowercase().contains(&wanted.to_lowercase())
    }
}

fn target_matches(elements: &[Element], i: usize, locator: &Locator) -> bool {
    let el = &elements[i];
    match &locator.target {
        Target::Css(selector) => css_matches(elements, i, selector),
        Target::Text(text) => text_matches(&el.text, text, locator.exact),
        Target::Role { role, name } => {
            el.role == Some(role.as_str())
                && name
                    .as_deref()
                    .map_or(true, |n| text_matches(&el.name, n, locator.exact))
        }
    }
}

/// Descendant selectors of `tag.class[attr='value']` compounds
fn css_matches(elements: &[Element], i: usize, selector: &str) -> bool {
    let parts: Vec<&str> = selector.split_whitespace().collect();
    let Some((last, ancestors)) = parts.split_last() else {
        return false;
    };
    if !compound_matches(&elements[i], last) {
        return false;
    }
    let mut current = elements[i].parent;
    for part in ancestors.iter().rev() {
        loop {
            match current {
                Some(p) if compound_matches(&elements[p], part) => {
                    current = elements[p].parent;
                    break;
                }
                Some(p) => current = elements[p].parent,
                None => return false,
            }
        }
    }
    true
}

fn compound_matches(el: &Element, compound: &str) -> bool {
    let (head, attr) = match compound.split_once('[') {
        Some((head, rest)) => (head, Some(rest.trim_end_matches(']'))),
        None => (compound, None),
    };
    let mut pieces = head.split('.');
    let tag = pieces.next().unwrap_or_default();
    if !tag.is_empty() && tag != el.tag {
        return false;
    }
    let classes = el
        .attrs
        .iter()
        .find(|(k, _)| *k == "class")
        .map(|(_, v)| v.as_str())
        .unwrap_or_default();
    if !pieces.all(|class| classes.split_whitespace().any(|c| c == class)) {
        return false;
    }
    match attr.and_then(|a| a.split_once('=')) {
        Some((key, value)) => {
            let value = value.trim_matches(|c| c == '\'' || c == '"');
            el.attrs.iter().any(|(k, v)| *k == key && v == value)
        }
        None => true,
    }
}

#[async_trait]
impl BrowserPage for FakeOpsDeck {
    async fn goto(&mut self, url: &str, _timeout: Duration) -> Result<()> {
        self.ensure_open()?;
        self.state.url = url.to_string();
        self.load_app();
        Ok(())
    }

    async fn reload(&mut self, _timeout: Duration) -> Result<()> {
        self.ensure_open()?;
        self.load_app();
        Ok(())
    }

    async fn probe(&mut self, locator: &Locator) -> Result<Probe> {
        self.ensure_open()?;
        if self.stall_probes {
            std::future::pending::<()>().await;
        }
        let (elements, found) = self.matches(locator);
        Ok(Probe {
            count: found.len(),
            visible: found.iter().filter(|&&i| elements[i].visible).count(),
        })
    }

    async fn click(&mut self, locator: &Locator) -> Result<()> {
        self.ensure_open()?;
        let el = self.single(locator)?;
        match el.on_click {
            Some(OnClick::Logout) => {
                self.request("POST", "/auth/logout");
                self.state = AppState {
                    url: std::mem::take(&mut self.state.url),
                    ..AppState::default()
                };
            }
            Some(OnClick::OpenModal) => self.state.modal_open = true,
            Some(OnClick::CreateTicket) => {
                let (status, _) = self.request("POST", "/api/tickets");
                if status == 201 {
                    self.state.modal_open = false;
                    self.state.toast = Some("Ticket created!".to_string());
                    self.load_tickets();
                } else {
                    self.state.toast = Some("Failed to create ticket".to_string());
                }
            }
            Some(OnClick::RoleMenu(i)) => self.state.role_menu = Some(i),
            None => {}
        }
        Ok(())
    }

    async fn fill(&mut self, locator: &Locator, value: &str) -> Result<()> {
        self.ensure_open()?;
        let el = self.single(locator)?;
        let name = el
            .attrs
            .iter()
            .find(|(k, _)| *k == "name")
            .map(|(_, v)| v.clone());
        match (el.tag, name) {
            ("input" | "textarea", Some(name)) => {
                self.state.values.insert(name, value.to_string());
                Ok(())
            }
            _ => Err(Error::Browser(format!("{} is not fillable", locator))),
        }
    }

    async fn click_at(&mut self, _x: f64, _y: f64) -> Result<()> {
        self.ensure_open()?;
        self.state.role_menu = None;
        Ok(())
    }

    async fn evaluate(&mut self, script: &str) -> Result<serde_json::Value> {
        self.ensure_open()?;
        self.log.lock().scripts.push(script.to_string());
        Ok(serde_json::Value::Null)
    }

    async fn screenshot(&mut self) -> Result<Vec<u8>> {
        self.ensure_open()?;
        Ok(PNG_MAGIC.to_vec())
    }

    async fn current_url(&mut self) -> Result<String> {
        self.ensure_open()?;
        Ok(self.state.url.clone())
    }

    async fn close(&mut self) -> Result<()> {
        self.log.lock().closed = true;
        Ok(())
    }
}

struct Run {
    result: ScenarioResult,
    log: Arc<Mutex<PageLog>>,
    elapsed: Duration,
    out: TempDir,
}

async fn run(scenario: &Scenario, stall_probes: bool) -> Run {
    let out = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.timeouts.wait_ms = 2_000;
    config.timeouts.assert_ms = 1_000;
    let overrides = RunOverrides {
        output_dir: Some(out.path().to_path_buf()),
        ..Default::default()
    };
    let plan = plan(&config, scenario, &overrides);

    let table = Arc::new(FixtureTable::new());
    let (mut page, log) = FakeOpsDeck::new(Arc::clone(&table));
    page.stall_probes = stall_probes;

    let started = Instant::now();
    let result = run_with_page(scenario, page, table, plan.session).await;
    Run {
        result,
        log,
        elapsed: started.elapsed(),
        out,
    }
}

async fn run_shipped(file: &str) -> Run {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("scenarios")
        .join("opsdeck")
        .join(file);
    let scenario = load_scenario(&path).unwrap();
    run(&scenario, false).await
}

fn assert_passed(result: &ScenarioResult) {
    assert!(
        result.passed(),
        "scenario '{}' failed: error={:?} failed checks={:?}",
        result.name,
        result.error,
        result.failed_checks().collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn test_profile_image_falls_back_after_fixture_swap() {
    let run = run_shipped("profile_image.yaml").await;
    assert_passed(&run.result);

    assert_eq!(run.result.checks.len(), 4);
    assert_eq!(run.log.lock().count("GET", "/api/me"), 2);

    for tag in ["with_avatar", "without_avatar"] {
        let artifact = run.result.artifact(tag).unwrap();
        assert!(artifact.path.starts_with(run.out.path()));
        assert_eq!(std::fs::read(&artifact.path).unwrap(), PNG_MAGIC);
    }
    assert!(run.log.lock().closed);
}

#[tokio::test]
async fn test_toast_after_ticket_creation() {
    let run = run_shipped("toasts.yaml").await;
    assert_passed(&run.result);

    let log = run.log.lock();
    let created: Vec<u16> = log
        .matching("POST", "/api/tickets")
        .map(|r| r.status)
        .collect();
    assert_eq!(created, vec![201]);

    // Initial empty list, then the refetch answered by the swapped fixture
    let lists: Vec<Vec<Ticket>> = log
        .matching("GET", "/api/tickets?organization_id=o1")
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .collect();
    assert_eq!(lists.len(), 2);
    assert!(lists[0].is_empty());
    assert_eq!(lists[1].len(), 1);
    assert_eq!(lists[1][0].id, "t1");
    assert_eq!(lists[1][0].title, "My First Ticket");

    let rendered = run
        .result
        .checks
        .iter()
        .find(|c| c.description.contains("My First Ticket"))
        .unwrap();
    assert!(rendered.passed);
    assert!(run.result.artifact("dashboard_toast").is_some());
}

#[tokio::test]
async fn test_role_menu_lists_other_roles() {
    let run = run_shipped("roles.yaml").await;
    assert_passed(&run.result);
    assert_eq!(run.result.checks.len(), 5);
    assert_eq!(run.log.lock().count("GET", "/api/organizations/org1/members"), 1);
}

#[tokio::test]
async fn test_logout_returns_to_login() {
    let run = run_shipped("logout.yaml").await;
    assert_passed(&run.result);
    assert_eq!(run.result.steps_run, run.result.steps_total);

    let log = run.log.lock();
    assert_eq!(log.count("POST", "/auth/logout"), 1);
    assert!(log.closed);
}

#[tokio::test]
async fn test_team_settings_uses_scenario_base_url() {
    let run = run_shipped("team_settings.yaml").await;
    assert_passed(&run.result);
    let log = run.log.lock();
    assert!(log
        .requests
        .iter()
        .all(|r| r.url.starts_with("http://localhost:5175/")));
}

#[tokio::test]
async fn test_wait_timeout_aborts_promptly_with_failure_screenshot() {
    let scenario = Scenario::from_yaml(
        r#"
name: Missing element
routes:
  - pattern: "**/api/me"
    respond: { status: 401 }
steps:
  - action: navigate
    url: /
  - action: wait_for
    locator: text=Never rendered
    timeout_ms: 200
  - name: unreachable
    action: screenshot
"#,
    )
    .unwrap();

    let run = run(&scenario, false).await;
    assert!(run.elapsed < Duration::from_secs(2), "took {:?}", run.elapsed);
    assert!(!run.result.passed());
    assert_eq!(run.result.error_kind, Some("TIMEOUT"));
    assert_eq!(run.result.steps_run, 2);
    assert_eq!(run.result.steps_total, 3);

    assert!(run.result.artifact("unreachable").is_none());
    let failure = run.result.artifact("failure").unwrap();
    assert!(failure.path.exists());
    assert!(run.log.lock().closed);
}

#[tokio::test]
async fn test_stalled_page_does_not_outlive_assertion_budget() {
    let scenario = Scenario::from_yaml(
        r#"
name: Stalled page
steps:
  - action: assert_visible
    locator: { role: button, name: Login with Google }
    timeout_ms: 300
  - action: evaluate
    script: document.title
"#,
    )
    .unwrap();

    let run = run(&scenario, true).await;
    assert!(run.elapsed < Duration::from_secs(2), "took {:?}", run.elapsed);
    assert!(run.result.error.is_none());
    assert_eq!(run.result.failed_checks().count(), 1);
    assert!(run.result.artifact("failed-step-1").is_some());
    // A failed check does not stop the scenario
    assert_eq!(run.result.steps_run, 2);
    assert_eq!(run.log.lock().scripts, vec!["document.title".to_string()]);
}

#[tokio::test]
async fn test_fail_fast_stops_at_first_failed_check() {
    let scenario = Scenario::from_yaml(
        r#"
name: Fail fast
fail_fast: true
routes:
  - pattern: "**/api/me"
    respond:
      body:
        me:
          user: { id: "1", email: a@example.com, name: A, avatar_url: "" }
steps:
  - action: navigate
    url: /
  - action: assert_count
    locator: img
    count: 1
    timeout_ms: 200
  - action: reload
"#,
    )
    .unwrap();

    let run = run(&scenario, false).await;
    assert_eq!(run.result.error_kind, Some("ASSERTION_FAILURE"));
    assert_eq!(run.result.steps_run, 2);
    assert_eq!(run.log.lock().count("GET", "/api/me"), 1);

    // The check's own capture serves as the failure screenshot
    let captured = run.result.artifact("failed-step-2").unwrap();
    assert!(captured.path.exists());
    assert!(run.result.artifact("failure").is_none());
}

#[tokio::test]
async fn test_failed_check_captures_screenshot_and_continues() {
    let scenario = Scenario::from_yaml(
        r#"
name: Failed check
routes:
  - pattern: "**/api/me"
    respond: { status: 401 }
steps:
  - action: navigate
    url: /
  - name: Dashboard heading
    action: assert_visible
    locator: text=Dashboard
    timeout_ms: 200
  - action: assert_visible
    locator: { role: button, name: Login with Google }
"#,
    )
    .unwrap();

    let run = run(&scenario, false).await;
    assert!(run.result.error.is_none());
    assert_eq!(run.result.steps_run, 3);

    let failed: Vec<_> = run.result.failed_checks().collect();
    assert_eq!(failed.len(), 1);
    let shot = failed[0].screenshot.as_deref().unwrap();
    assert!(shot.ends_with("failed-dashboard-heading.png"));
    assert!(shot.starts_with(run.out.path()));
    assert_eq!(std::fs::read(shot).unwrap(), PNG_MAGIC);

    let artifact = run.result.artifact("failed-Dashboard heading").unwrap();
    assert_eq!(artifact.path, shot);
    // Passing checks capture nothing
    assert_eq!(run.result.artifacts.len(), 1);
    assert!(run.result.checks[1].screenshot.is_none());
}

#[tokio::test]
async fn test_ambiguous_click_is_element_not_found() {
    let scenario = Scenario::from_yaml(
        r#"
name: Ambiguous click
routes:
  - pattern: "**/api/me"
    respond:
      body:
        me:
          user: { id: "1", email: a@example.com, name: A }
          organizations: [{ id: o1, name: Org }]
  - pattern: "**/api/tickets?*"
    respond:
      body: { tickets: [] }
steps:
  - action: navigate
    url: /
  - action: click
    locator: { role: button, name: New Ticket }
"#,
    )
    .unwrap();

    let run = run(&scenario, false).await;
    assert_eq!(run.result.error_kind, Some("ELEMENT_NOT_FOUND"));
    let error = run.result.error.unwrap();
    assert!(error.contains("2"), "{}", error);
}
