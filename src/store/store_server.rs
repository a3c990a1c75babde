// src/store/store_server.rs — Async message passing for Store
//
// The Store owns a single rusqlite Connection, which is not Sync. One task
// owns it and serves commands; request handlers talk to it through a
// cloneable StoreHandle.

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, oneshot};

use crate::store::store::{MessageRow, ReportRow, SessionRow, Store, WebsiteRow};

type Reply<T> = oneshot::Sender<anyhow::Result<T>>;

#[derive(Debug)]
pub enum StoreCommand {
    EnsureSession {
        id: String,
        resp: Reply<SessionRow>,
    },
    GetSession {
        id: String,
        resp: Reply<Option<SessionRow>>,
    },
    RecordAnalysis {
        id: String,
        session_id: String,
        website_url: String,
        at: DateTime<Utc>,
        resp: Reply<()>,
    },
    CountAnalysesSince {
        session_id: String,
        since: DateTime<Utc>,
        resp: Reply<u32>,
    },
    EarliestAnalysisSince {
        session_id: String,
        since: DateTime<Utc>,
        resp: Reply<Option<DateTime<Utc>>>,
    },
    CheckSessionQuota {
        session_id: String,
        max: u32,
        since: DateTime<Utc>,
        resp: Reply<bool>,
    },
    InsertWebsite {
        id: String,
        url: String,
        name: Option<String>,
        product_type: Option<String>,
        resp: Reply<WebsiteRow>,
    },
    GetWebsite {
        id: String,
        resp: Reply<Option<WebsiteRow>>,
    },
    UpdateWebsite {
        id: String,
        name: Option<String>,
        product_type: Option<String>,
        resp: Reply<Option<WebsiteRow>>,
    },
    DeleteWebsite {
        id: String,
        resp: Reply<bool>,
    },
    ListWebsites {
        resp: Reply<Vec<WebsiteRow>>,
    },
    InsertMessage {
        id: String,
        session_id: String,
        role: String,
        content: String,
        resp: Reply<()>,
    },
    ListMessages {
        session_id: String,
        resp: Reply<Vec<MessageRow>>,
    },
    InsertReport {
        id: String,
        website_id: String,
        content: String,
        suggestions: Vec<String>,
        resp: Reply<ReportRow>,
    },
    GetReport {
        id: String,
        resp: Reply<Option<ReportRow>>,
    },
    DeleteReport {
        id: String,
        resp: Reply<bool>,
    },
    ListReports {
        website_id: String,
        resp: Reply<Vec<ReportRow>>,
    },
}

/// A handle to the Store that uses message passing.
#[derive(Clone)]
pub struct StoreHandle {
    tx: mpsc::Sender<StoreCommand>,
}

impl StoreHandle {
    pub fn new(tx: mpsc::Sender<StoreCommand>) -> Self {
        Self { tx }
    }

    async fn call<T>(&self, make: impl FnOnce(Reply<T>) -> StoreCommand) -> anyhow::Result<T> {
        let (resp_tx, resp_rx) = oneshot::channel();
        self.tx
            .send(make(resp_tx))
            .await
            .map_err(|_| anyhow::anyhow!("store server is not running"))?;
        resp_rx.await?
    }

    pub async fn ensure_session(&self, id: String) -> anyhow::Result<SessionRow> {
        self.call(|resp| StoreCommand::EnsureSession { id, resp })
            .await
    }

    pub async fn get_session(&self, id: String) -> anyhow::Result<Option<SessionRow>> {
        self.call(|resp| StoreCommand::GetSession { id, resp }).await
    }

    pub async fn record_analysis(
        &self,
        id: String,
        session_id: String,
        website_url: String,
    ) -> anyhow::Result<()> {
        self.record_analysis_at(id, session_id, website_url, Utc::now())
            .await
    }

    pub async fn record_analysis_at(
        &self,
        id: String,
        session_id: String,
        website_url: String,
        at: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        self.call(|resp| StoreCommand::RecordAnalysis {
            id,
            session_id,
            website_url,
            at,
            resp,
        })
        .await
    }

    pub async fn count_analyses_since(
        &self,
        session_id: String,
        since: DateTime<Utc>,
    ) -> anyhow::Result<u32> {
        self.call(|resp| StoreCommand::CountAnalysesSince {
            session_id,
            since,
            resp,
        })
        .await
    }

    pub async fn earliest_analysis_since(
        &self,
        session_id: String,
        since: DateTime<Utc>,
    ) -> anyhow::Result<Option<DateTime<Utc>>> {
        self.call(|resp| StoreCommand::EarliestAnalysisSince {
            session_id,
            since,
            resp,
        })
        .await
    }

    pub async fn check_session_quota(
        &self,
        session_id: String,
        max: u32,
        since: DateTime<Utc>,
    ) -> anyhow::Result<bool> {
        self.call(|resp| StoreCommand::CheckSessionQuota {
            session_id,
            max,
            since,
            resp,
        })
        .await
    }

    pub async fn insert_website(
        &self,
        id: String,
        url: String,
        name: Option<String>,
        product_type: Option<String>,
    ) -> anyhow::Result<WebsiteRow> {
        self.call(|resp| StoreCommand::InsertWebsite {
            id,
            url,
            name,
            product_type,
            resp,
        })
        .await
    }

    pub async fn get_website(&self, id: String) -> anyhow::Result<Option<WebsiteRow>> {
        self.call(|resp| StoreCommand::GetWebsite { id, resp }).await
    }

    pub async fn update_website(
        &self,
        id: String,
        name: Option<String>,
        product_type: Option<String>,
    ) -> anyhow::Result<Option<WebsiteRow>> {
        self.call(|resp| StoreCommand::UpdateWebsite {
            id,
            name,
            product_type,
            resp,
        })
        .await
    }

    pub async fn delete_website(&self, id: String) -> anyhow::Result<bool> {
        self.call(|resp| StoreCommand::DeleteWebsite { id, resp })
            .await
    }

    pub async fn list_websites(&self) -> anyhow::Result<Vec<WebsiteRow>> {
        self.call(|resp| StoreCommand::ListWebsites { resp }).await
    }

    pub async fn insert_message(
        &self,
        id: String,
        session_id: String,
        role: String,
        content: String,
    ) -> anyhow::Result<()> {
        self.call(|resp| StoreCommand::InsertMessage {
            id,
            session_id,
            role,
            content,
            resp,
        })
        .await
    }

    pub async fn list_messages(&self, session_id: String) -> anyhow::Result<Vec<MessageRow>> {
        self.call(|resp| StoreCommand::ListMessages { session_id, resp })
            .await
    }

    pub async fn insert_report(
        &self,
        id: String,
        website_id: String,
        content: String,
        suggestions: Vec<String>,
    ) -> anyhow::Result<ReportRow> {
        self.call(|resp| StoreCommand::InsertReport {
            id,
            website_id,
            content,
            suggestions,
            resp,
        })
        .await
    }

    pub async fn get_report(&self, id: String) -> anyhow::Result<Option<ReportRow>> {
        self.call(|resp| StoreCommand::GetReport { id, resp }).await
    }

    pub async fn delete_report(&self, id: String) -> anyhow::Result<bool> {
        self.call(|resp| StoreCommand::DeleteReport { id, resp })
            .await
    }

    pub async fn list_reports(&self, website_id: String) -> anyhow::Result<Vec<ReportRow>> {
        self.call(|resp| StoreCommand::ListReports { website_id, resp })
            .await
    }
}

/// Helper to spawn the store server and return a handle.
pub fn spawn_store_server(store: Store) -> (StoreHandle, tokio::task::JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(100);
    let handle = StoreHandle::new(tx);
    let join_handle = tokio::spawn(run_store_server(store, rx));
    (handle, join_handle)
}

pub async fn run_store_server(store: Store, mut rx: mpsc::Receiver<StoreCommand>) {
    while let Some(cmd) = rx.recv().await {
        match cmd {
            StoreCommand::EnsureSession { id, resp } => {
                let _ = resp.send(store.ensure_session(&id));
            }
            StoreCommand::GetSession { id, resp } => {
                let _ = resp.send(store.get_session(&id));
            }
            StoreCommand::RecordAnalysis {
                id,
                session_id,
                website_url,
                at,
                resp,
            } => {
                let _ = resp.send(store.record_analysis(&id, &session_id, &website_url, at));
            }
            StoreCommand::CountAnalysesSince {
                session_id,
                since,
                resp,
            } => {
                let _ = resp.send(store.count_analyses_since(&session_id, since));
            }
            StoreCommand::EarliestAnalysisSince {
                session_id,
                since,
                resp,
            } => {
                let _ = resp.send(store.earliest_analysis_since(&session_id, since));
            }
            StoreCommand::CheckSessionQuota {
                session_id,
                max,
                since,
                resp,
            } => {
                let _ = resp.send(store.check_session_quota(&session_id, max, since));
            }
            StoreCommand::InsertWebsite {
                id,
                url,
                name,
                product_type,
                resp,
            } => {
                let res = store.insert_website(&id, &url, name.as_deref(), product_type.as_deref());
                let _ = resp.send(res);
            }
            StoreCommand::GetWebsite { id, resp } => {
                let _ = resp.send(store.get_website(&id));
            }
            StoreCommand::UpdateWebsite {
                id,
                name,
                product_type,
                resp,
            } => {
                let res = store.update_website(&id, name.as_deref(), product_type.as_deref());
                let _ = resp.send(res);
            }
            StoreCommand::DeleteWebsite { id, resp } => {
                let _ = resp.send(store.delete_website(&id));
            }
            StoreCommand::ListWebsites { resp } => {
                let _ = resp.send(store.list_websites());
            }
            StoreCommand::InsertMessage {
                id,
                session_id,
                role,
                content,
                resp,
            } => {
                let _ = resp.send(store.insert_message(&id, &session_id, &role, &content));
            }
            StoreCommand::ListMessages { session_id, resp } => {
                let _ = resp.send(store.list_messages(&session_id));
            }
            StoreCommand::InsertReport {
                id,
                website_id,
                content,
                suggestions,
                resp,
            } => {
                let res = store.insert_report(&id, &website_id, &content, &suggestions);
                let _ = resp.send(res);
            }
            StoreCommand::GetReport { id, resp } => {
                let _ = resp.send(store.get_report(&id));
            }
            StoreCommand::DeleteReport { id, resp } => {
                let _ = resp.send(store.delete_report(&id));
            }
            StoreCommand::ListReports { website_id, resp } => {
                let _ = resp.send(store.list_reports(&website_id));
            }
        }
    }
}
