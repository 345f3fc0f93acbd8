//! REST client for a hosted record store.
//!
//! Collections map onto `{base_url}/{collection}` and records onto
//! `{base_url}/{collection}/{id}`. Listing passes the `where` constraints as a
//! JSON object and the ordering as `field:asc|desc`.

use async_trait::async_trait;
use serde_json::Value;

use super::remote::{Collection, ListQuery, RecordStore};
use crate::errors::RemoteError;

#[derive(Clone)]
pub struct HttpRecordStore {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpRecordStore {
    pub fn new(base_url: &str, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    pub fn collection_url(&self, collection: Collection) -> String {
        format!("{}/{}", self.base_url, collection.as_str())
    }

    pub fn record_url(&self, collection: Collection, id: &str) -> String {
        format!("{}/{}/{}", self.base_url, collection.as_str(), id)
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => req.bearer_auth(key),
            None => req,
        }
    }

    async fn send(&self, req: reqwest::RequestBuilder) -> Result<reqwest::Response, RemoteError> {
        let resp = self
            .authorize(req)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| RemoteError::Unavailable(e.to_string()))?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(RemoteError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

/// Query-string pairs for a list request.
pub fn list_params(query: &ListQuery) -> Vec<(&'static str, String)> {
    let mut params = Vec::new();
    if !query.filter.is_empty() {
        let filter: serde_json::Map<String, Value> = query
            .filter
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        params.push(("where", Value::Object(filter).to_string()));
    }
    if let Some((field, order)) = &query.order_by {
        params.push(("orderBy", format!("{}:{}", field, order.as_str())));
    }
    params
}

#[async_trait]
impl RecordStore for HttpRecordStore {
    async fn list(
        &self,
        collection: Collection,
        query: &ListQuery,
    ) -> Result<Vec<Value>, RemoteError> {
        let req = self
            .client
            .get(self.collection_url(collection))
            .query(&list_params(query));
        let resp = self.send(req).await?;
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| RemoteError::Unavailable(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| RemoteError::Decode {
            collection: collection.to_string(),
            source: e,
        })
    }

    async fn create(&self, collection: Collection, record: &Value) -> Result<(), RemoteError> {
        let req = self.client.post(self.collection_url(collection)).json(record);
        self.send(req).await.map(|_| ())
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        patch: &Value,
    ) -> Result<(), RemoteError> {
        let req = self.client.patch(self.record_url(collection, id)).json(patch);
        match self.send(req).await {
            Err(RemoteError::Status { status: 404, .. }) => Err(RemoteError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            }),
            other => other.map(|_| ()),
        }
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), RemoteError> {
        let req = self.client.delete(self.record_url(collection, id));
        self.send(req).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::remote::SortOrder;

    #[test]
    fn test_urls_strip_trailing_slash() {
        let store = HttpRecordStore::new("https://records.example.com/api/", None);
        assert_eq!(
            store.collection_url(Collection::Tasks),
            "https://records.example.com/api/tasks"
        );
        assert_eq!(
            store.record_url(Collection::Subtasks, "subtask-1"),
            "https://records.example.com/api/subtasks/subtask-1"
        );
    }

    #[test]
    fn test_list_params_encode_where_and_order() {
        let query = ListQuery::owned_by("u1")
            .where_eq("boardId", "b1")
            .order_by("position", SortOrder::Asc);
        let params = list_params(&query);
        assert_eq!(params.len(), 2);
        assert_eq!(params[0].0, "where");
        let filter: Value = serde_json::from_str(&params[0].1).unwrap();
        assert_eq!(filter["ownerId"], "u1");
        assert_eq!(filter["boardId"], "b1");
        assert_eq!(params[1], ("orderBy", "position:asc".to_string()));
    }

    #[test]
    fn test_list_params_empty_query() {
        assert!(list_params(&ListQuery::default()).is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_host_is_unavailable() {
        // Port 9 (discard) on localhost is not expected to serve HTTP.
        let store = HttpRecordStore::new("http://127.0.0.1:9", None);
        let err = store
            .list(Collection::Boards, &ListQuery::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteError::Unavailable(_)));
    }
}
