//! Decision-table tests for sidebar injection and removal.
//!
//! The fakes log every script call and navigation so the tests can assert
//! not just the outcome but that the failure branches complete without
//! touching the page.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use async_trait::async_trait;
use sidenote_extension::{
    Blocklist, ContentScripts, ContentType, Decision, FileAccess, InjectionError, SidebarInjector,
    SkipReason, Tab, TabControl, TabId,
};
use url::Url;

struct FakeScripts {
    content_type: ContentType,
    injected: Rc<Cell<bool>>,
    fail_embed: bool,
    calls: Rc<RefCell<Vec<&'static str>>>,
}

#[async_trait(?Send)]
impl ContentScripts for FakeScripts {
    async fn detect_content_type(&self, _tab: &Tab) -> Result<ContentType, InjectionError> {
        self.calls.borrow_mut().push("detect");
        Ok(self.content_type)
    }

    async fn is_client_injected(&self, _tab: &Tab) -> Result<bool, InjectionError> {
        self.calls.borrow_mut().push("is_injected");
        Ok(self.injected.get())
    }

    async fn inject_config(&self, _tab: &Tab) -> Result<(), InjectionError> {
        self.calls.borrow_mut().push("config");
        Ok(())
    }

    async fn inject_embed(&self, _tab: &Tab) -> Result<(), InjectionError> {
        self.calls.borrow_mut().push("embed");
        if self.fail_embed {
            Err(InjectionError::Failed("embed blew up".into()))
        } else {
            self.injected.set(true);
            Ok(())
        }
    }

    async fn inject_destroy(&self, _tab: &Tab) -> Result<(), InjectionError> {
        self.calls.borrow_mut().push("destroy");
        self.injected.set(false);
        Ok(())
    }
}

struct FakeTabs {
    navigations: Rc<RefCell<Vec<(TabId, String)>>>,
}

#[async_trait(?Send)]
impl TabControl for FakeTabs {
    async fn navigate(&self, tab: TabId, url: &str) -> Result<(), InjectionError> {
        self.navigations.borrow_mut().push((tab, url.to_owned()));
        Ok(())
    }
}

struct FakeFileAccess {
    allowed: bool,
}

#[async_trait(?Send)]
impl FileAccess for FakeFileAccess {
    async fn allowed(&self) -> bool {
        self.allowed
    }
}

struct Harness {
    injector: SidebarInjector<FakeScripts, FakeTabs, FakeFileAccess>,
    calls: Rc<RefCell<Vec<&'static str>>>,
    navigations: Rc<RefCell<Vec<(TabId, String)>>>,
}

fn harness(content_type: ContentType, injected: bool, file_access: bool) -> Harness {
    let calls = Rc::new(RefCell::new(Vec::new()));
    let navigations = Rc::new(RefCell::new(Vec::new()));
    let scripts = FakeScripts {
        content_type,
        injected: Rc::new(Cell::new(injected)),
        fail_embed: false,
        calls: Rc::clone(&calls),
    };
    let tabs = FakeTabs {
        navigations: Rc::clone(&navigations),
    };
    let injector = SidebarInjector::new(
        scripts,
        tabs,
        FakeFileAccess {
            allowed: file_access,
        },
        Url::parse("chrome-extension://abcdef").unwrap(),
        Blocklist::new(["twitter.com", "facebook.com"]),
    );
    Harness {
        injector,
        calls,
        navigations,
    }
}

fn html_harness() -> Harness {
    harness(ContentType::Html, false, false)
}

#[tokio::test]
async fn restricted_pages_fail_without_any_script_calls() {
    let h = html_harness();
    for url in [
        "chrome://extensions/",
        "chrome-devtools://inspect",
        "chrome-extension://other/page.html",
    ] {
        let decision = h.injector.decide(&Tab::new(1, url)).await;
        assert_eq!(
            decision,
            Decision::Fail(InjectionError::RestrictedProtocol),
            "for {url}"
        );
    }
    assert!(h.calls.borrow().is_empty());
    assert!(h.navigations.borrow().is_empty());
}

#[tokio::test]
async fn blocklisted_sites_fail_silently_without_any_script_calls() {
    let h = html_harness();
    let decision = h
        .injector
        .decide(&Tab::new(1, "https://twitter.com/some/status"))
        .await;
    assert_eq!(decision, Decision::Fail(InjectionError::BlockedSite));
    assert!(h.calls.borrow().is_empty());
}

#[tokio::test]
async fn local_pdf_with_file_access_redirects_to_the_viewer() {
    let h = harness(ContentType::Html, false, true);
    let tab = Tab::new(3, "file:///home/me/paper.pdf");

    let decision = h.injector.decide(&tab).await;
    assert_eq!(
        decision,
        Decision::RedirectToViewer(
            "chrome-extension://abcdef/content/web/viewer.html?file=file%3A%2F%2F%2Fhome%2Fme%2Fpaper.pdf"
                .into()
        )
    );

    h.injector.inject_into_tab(&tab).await.unwrap();
    assert_eq!(h.navigations.borrow().len(), 1);
    assert_eq!(h.navigations.borrow()[0].0, 3);
    // The viewer redirect never runs scripts in the file: tab.
    assert!(h.calls.borrow().is_empty());
}

#[tokio::test]
async fn local_pdf_without_file_access_fails_without_any_script_calls() {
    let h = harness(ContentType::Html, false, false);
    let decision = h
        .injector
        .decide(&Tab::new(1, "file:///home/me/paper.pdf"))
        .await;
    assert_eq!(decision, Decision::Fail(InjectionError::NoFileAccess));
    assert!(h.calls.borrow().is_empty());
    assert!(h.navigations.borrow().is_empty());
}

#[tokio::test]
async fn local_html_is_unsupported() {
    let h = harness(ContentType::Html, false, true);
    let decision = h
        .injector
        .decide(&Tab::new(1, "file:///home/me/notes.html"))
        .await;
    assert_eq!(decision, Decision::Fail(InjectionError::LocalFile));
    assert!(h.calls.borrow().is_empty());
}

#[tokio::test]
async fn remote_pdf_redirects_to_the_viewer_with_the_encoded_url() {
    let h = harness(ContentType::Pdf, false, false);
    let decision = h
        .injector
        .decide(&Tab::new(1, "http://example.com/doc.pdf"))
        .await;
    assert_eq!(
        decision,
        Decision::RedirectToViewer(
            "chrome-extension://abcdef/content/web/viewer.html?file=http%3A%2F%2Fexample.com%2Fdoc.pdf"
                .into()
        )
    );
}

#[tokio::test]
async fn html_pages_get_config_before_embed() {
    let h = html_harness();
    let tab = Tab::new(1, "http://example.com/article");
    h.injector.inject_into_tab(&tab).await.unwrap();
    assert_eq!(
        h.calls.borrow().as_slice(),
        &["detect", "is_injected", "config", "embed"]
    );
}

#[tokio::test]
async fn already_injected_pages_are_skipped() {
    let h = harness(ContentType::Html, true, false);
    let tab = Tab::new(1, "http://example.com/article");
    assert_eq!(
        h.injector.decide(&tab).await,
        Decision::Skip(SkipReason::AlreadyInjected)
    );

    h.calls.borrow_mut().clear();
    h.injector.inject_into_tab(&tab).await.unwrap();
    assert_eq!(h.calls.borrow().as_slice(), &["detect", "is_injected"]);
}

#[tokio::test]
async fn removal_from_the_viewer_navigates_back_to_the_document() {
    let h = html_harness();
    let tab = Tab::new(
        4,
        "chrome-extension://abcdef/content/web/viewer.html?file=http%3A%2F%2Fexample.com%2Fdoc.pdf",
    );
    h.injector.remove_from_tab(&tab).await.unwrap();
    assert_eq!(
        h.navigations.borrow().as_slice(),
        &[(4, "http://example.com/doc.pdf".to_owned())]
    );
    assert!(h.calls.borrow().is_empty());
}

#[tokio::test]
async fn removal_leaves_restricted_pages_alone() {
    let h = html_harness();
    h.injector
        .remove_from_tab(&Tab::new(1, "chrome://extensions/"))
        .await
        .unwrap();
    assert!(h.calls.borrow().is_empty());
    assert!(h.navigations.borrow().is_empty());
}

#[tokio::test]
async fn removal_destroys_an_injected_client() {
    let h = harness(ContentType::Html, true, false);
    h.injector
        .remove_from_tab(&Tab::new(1, "http://example.com/article"))
        .await
        .unwrap();
    assert_eq!(
        h.calls.borrow().as_slice(),
        &["detect", "is_injected", "destroy"]
    );
}

#[tokio::test]
async fn removal_is_a_noop_without_an_injected_client() {
    let h = html_harness();
    h.injector
        .remove_from_tab(&Tab::new(1, "http://example.com/article"))
        .await
        .unwrap();
    assert_eq!(h.calls.borrow().as_slice(), &["detect", "is_injected"]);
}
