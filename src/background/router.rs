/// Request dispatch for the background context
use super::broadcast::Subscriber;
use super::store::LogStore;
use crate::messages::{AllLogsResponse, LoggedResponse, MessageSender, Request, Response};
use crate::storage::Persistence;

/// Apply one request to the store and build its response.
///
/// Returns `None` for requests addressed to content scripts, so the
/// background leaves them unanswered.
pub fn handle_request<P, S>(
    store: &mut LogStore<P, S>,
    request: Request,
    sender: &MessageSender,
) -> Option<Response>
where
    P: Persistence,
    S: Subscriber,
{
    match request {
        Request::LogEntries { entries } => {
            match store.append(sender.tab_id(), entries, sender.meta()) {
                Ok(outcome) => Some(Response::Logged(LoggedResponse {
                    ok: true,
                    total: outcome.total,
                    tab_id: outcome.tab_id,
                })),
                Err(e) => {
                    log::debug!("Rejected logEntries: {}", e);
                    Some(Response::failed(&e))
                }
            }
        }
        Request::GetAllLogs => Some(Response::AllLogs(AllLogsResponse {
            tab_logs: store.get_all().clone(),
        })),
        Request::ClearLogs => {
            store.clear_all();
            Some(Response::ack(true))
        }
        Request::RemoveTabLogs { tab_id } => {
            match tab_id {
                Some(tab_id) => store.remove_tab(tab_id),
                None => log::debug!("removeTabLogs without a tab id, ignoring"),
            }
            Some(Response::ack(true))
        }
        Request::InjectInput { .. } | Request::TriggerSubmit => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::background::store::tests::test_store;
    use crate::messages::UpdateTag;
    use serde_json::json;

    fn log_entries(entries: &[&str]) -> Request {
        Request::LogEntries {
            entries: entries.iter().map(|e| e.to_string()).collect(),
        }
    }

    fn tab_sender(id: i32) -> MessageSender {
        MessageSender::from_tab(id, "https://chatgpt.com/c/abc", "ChatGPT")
    }

    #[test]
    fn test_end_to_end_append_scenario() {
        let (mut store, _, subscriber) = test_store();

        let first = handle_request(&mut store, log_entries(&["a", "b"]), &tab_sender(7));
        let second = handle_request(&mut store, log_entries(&["b", "c"]), &tab_sender(7));

        assert_eq!(
            serde_json::to_value(first.unwrap()).unwrap(),
            json!({"ok": true, "total": 2, "tabId": 7})
        );
        assert_eq!(
            serde_json::to_value(second.unwrap()).unwrap(),
            json!({"ok": true, "total": 3, "tabId": 7})
        );
        assert_eq!(store.get_all().get(7).unwrap().entries, vec!["a", "b", "c"]);
        assert_eq!(subscriber.tags(), vec![UpdateTag::Tab(7), UpdateTag::Tab(7)]);
    }

    #[test]
    fn test_log_entries_without_tab() {
        let (mut store, _, _) = test_store();

        let response = handle_request(&mut store, log_entries(&["a"]), &MessageSender::default());

        assert_eq!(
            serde_json::to_value(response.unwrap()).unwrap(),
            json!({"ok": false, "error": "no-tab-id"})
        );
        assert!(store.get_all().is_empty());
    }

    #[test]
    fn test_get_all_logs_snapshot() {
        let (mut store, _, _) = test_store();
        handle_request(&mut store, log_entries(&["x"]), &tab_sender(2));

        let response = handle_request(&mut store, Request::GetAllLogs, &MessageSender::default());

        let json = serde_json::to_value(response.unwrap()).unwrap();
        assert_eq!(json["tabLogs"]["2"]["entries"], json!(["x"]));
        assert_eq!(json["tabLogs"]["2"]["url"], "https://chatgpt.com/c/abc");
    }

    #[test]
    fn test_clear_logs() {
        let (mut store, _, subscriber) = test_store();
        handle_request(&mut store, log_entries(&["x"]), &tab_sender(2));

        let response = handle_request(&mut store, Request::ClearLogs, &MessageSender::default());

        assert_eq!(response, Some(Response::ack(true)));
        assert!(store.get_all().is_empty());
        assert_eq!(subscriber.tags().last(), Some(&UpdateTag::All));
    }

    #[test]
    fn test_remove_tab_logs_without_id_is_noop() {
        let (mut store, persistence, subscriber) = test_store();
        handle_request(&mut store, log_entries(&["x"]), &tab_sender(2));

        let response = handle_request(
            &mut store,
            Request::RemoveTabLogs { tab_id: None },
            &MessageSender::default(),
        );

        assert_eq!(response, Some(Response::ack(true)));
        assert_eq!(store.get_all().len(), 1);
        assert_eq!(persistence.save_count(), 1);
        assert_eq!(subscriber.tags(), vec![UpdateTag::Tab(2)]);
    }

    #[test]
    fn test_remove_tab_logs_with_id() {
        let (mut store, _, subscriber) = test_store();
        handle_request(&mut store, log_entries(&["x"]), &tab_sender(2));

        handle_request(
            &mut store,
            Request::RemoveTabLogs { tab_id: Some(2) },
            &MessageSender::default(),
        );

        assert!(store.get_all().is_empty());
        assert_eq!(subscriber.tags(), vec![UpdateTag::Tab(2), UpdateTag::All]);
    }

    #[test]
    fn test_content_requests_are_not_answered() {
        let (mut store, _, _) = test_store();

        let inject = handle_request(
            &mut store,
            Request::InjectInput { text: "hi".to_string() },
            &MessageSender::default(),
        );
        let submit = handle_request(&mut store, Request::TriggerSubmit, &MessageSender::default());

        assert_eq!(inject, None);
        assert_eq!(submit, None);
    }
}
