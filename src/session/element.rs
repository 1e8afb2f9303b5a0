//! Element reference implementation
//!
//! Elements are `Runtime` remote objects. Every operation is a `Runtime.callFunctionOn`
//! against the object id; each function first checks `isConnected` so that detached nodes
//! surface as `Error::StaleElement` instead of silently acting on a dead node.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::cdp::client::CdpClientImpl;
use crate::cdp::traits::CdpClient;
use crate::cdp::types::{CallArgument, RemoteObject};
use crate::locator::By;
use crate::session::traits::{BoundingBox, ElementRef, EvaluationResult};
use crate::Error;

const STALE_GUARD: &str = "if (!this.isConnected) { throw new Error('stale element reference: element is not attached to the page document'); }";

/// Outcome of the pre-click hit test
#[derive(Debug, Deserialize)]
struct HitTest {
    status: String,
    #[serde(default)]
    x: f64,
    #[serde(default)]
    y: f64,
    #[serde(default)]
    by: Option<String>,
}

/// Element reference implementation
#[derive(Debug)]
pub struct ElementRefImpl {
    id: String,
    page_id: String,
    object_id: String,
    cdp_client: Arc<dyn CdpClient>,
}

impl ElementRefImpl {
    /// Create a new element reference
    pub fn new(page_id: String, object_id: String, cdp_client: Arc<dyn CdpClient>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            page_id,
            object_id,
            cdp_client,
        }
    }

    /// Runtime object id backing this handle
    pub fn object_id(&self) -> &str {
        &self.object_id
    }

    /// Wrap `body` in a function with the stale guard prepended
    fn guarded(params: &str, body: &str) -> String {
        format!("function({}) {{ {} {} }}", params, STALE_GUARD, body)
    }

    async fn call(&self, params: &str, body: &str, args: Vec<CallArgument>) -> Result<RemoteObject, Error> {
        self.cdp_client
            .call_function_on(&self.object_id, &Self::guarded(params, body), args, true)
            .await
    }

    async fn call_for_handle(&self, params: &str, body: &str, args: Vec<CallArgument>) -> Result<RemoteObject, Error> {
        self.cdp_client
            .call_function_on(&self.object_id, &Self::guarded(params, body), args, false)
            .await
    }

    async fn call_string(&self, params: &str, body: &str, args: Vec<CallArgument>) -> Result<Option<String>, Error> {
        let result = self.call(params, body, args).await?;
        Ok(result.value.and_then(|v| match v {
            serde_json::Value::String(s) => Some(s),
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        }))
    }

    async fn call_bool(&self, body: &str) -> Result<bool, Error> {
        let result = self.call("", body, vec![]).await?;
        Ok(result.value.and_then(|v| v.as_bool()).unwrap_or(false))
    }

    async fn dispatch_mouse(&self, kind: &str, x: f64, y: f64) -> Result<(), Error> {
        let mut params = json!({ "type": kind, "x": x, "y": y });
        if kind != "mouseMoved" {
            params["button"] = json!("left");
            params["clickCount"] = json!(1);
        }
        self.cdp_client.call_method("Input.dispatchMouseEvent", params).await?;
        Ok(())
    }
}

/// Turn a remote array of nodes into element handles, in index order.
pub(crate) async fn collect_elements(
    cdp_client: &Arc<dyn CdpClient>,
    page_id: &str,
    array: RemoteObject,
) -> Result<Vec<Arc<dyn ElementRef>>, Error> {
    let Some(array_id) = array.object_id else {
        return Ok(Vec::new());
    };

    let mut indexed: Vec<(usize, String)> = cdp_client
        .get_properties(&array_id)
        .await?
        .into_iter()
        .filter_map(|prop| {
            let index = prop.name.parse::<usize>().ok()?;
            let object_id = prop.value?.object_id?;
            Some((index, object_id))
        })
        .collect();
    indexed.sort_by_key(|(index, _)| *index);

    Ok(indexed
        .into_iter()
        .map(|(_, object_id)| {
            Arc::new(ElementRefImpl::new(page_id.to_string(), object_id, Arc::clone(cdp_client)))
                as Arc<dyn ElementRef>
        })
        .collect())
}

#[async_trait]
impl ElementRef for ElementRefImpl {
    fn id(&self) -> &str {
        &self.id
    }

    fn page_id(&self) -> &str {
        &self.page_id
    }

    async fn find_elements(&self, by: &By) -> Result<Vec<Arc<dyn ElementRef>>, Error> {
        let body = format!("const root = this; return {};", by.query_expression());
        let array = self.call_for_handle("", &body, vec![]).await?;
        collect_elements(&self.cdp_client, &self.page_id, array).await
    }

    async fn shadow_root(&self) -> Result<Option<Arc<dyn ElementRef>>, Error> {
        let root = self
            .call_for_handle("", "return this.shadowRoot || null;", vec![])
            .await?;
        if root.is_nullish() {
            return Ok(None);
        }
        Ok(root.object_id.map(|object_id| {
            Arc::new(ElementRefImpl::new(
                self.page_id.clone(),
                object_id,
                Arc::clone(&self.cdp_client),
            )) as Arc<dyn ElementRef>
        }))
    }

    async fn text(&self) -> Result<String, Error> {
        let text = self
            .call_string(
                "",
                "const t = this.innerText; return typeof t === 'string' ? t : (this.textContent || '');",
                vec![],
            )
            .await?;
        Ok(text.unwrap_or_default())
    }

    async fn attribute(&self, name: &str) -> Result<Option<String>, Error> {
        self.call_string(
            "name",
            "return this.getAttribute ? this.getAttribute(name) : null;",
            vec![CallArgument::value(json!(name))],
        )
        .await
    }

    async fn property(&self, name: &str) -> Result<Option<String>, Error> {
        self.call_string(
            "name",
            "const v = this[name]; return v === undefined || v === null ? null : String(v);",
            vec![CallArgument::value(json!(name))],
        )
        .await
    }

    async fn click(&self) -> Result<(), Error> {
        let hit = self
            .call(
                "",
                r#"this.scrollIntoView({ block: 'center', inline: 'center' });
                const r = this.getBoundingClientRect();
                if (r.width === 0 || r.height === 0) { return { status: 'empty' }; }
                const x = r.left + r.width / 2;
                const y = r.top + r.height / 2;
                const scope = this.getRootNode();
                const hit = (typeof scope.elementFromPoint === 'function' ? scope : document).elementFromPoint(x, y);
                for (let n = hit; n; n = n.parentNode || n.host) {
                    if (n === this) { return { status: 'ok', x, y }; }
                }
                const by = hit ? hit.tagName.toLowerCase() + (hit.id ? '#' + hit.id : '') : 'nothing';
                return { status: 'intercepted', x, y, by };"#,
                vec![],
            )
            .await?;

        let hit: HitTest = serde_json::from_value(hit.value.unwrap_or_default())
            .map_err(|e| Error::internal(format!("Unexpected hit test result: {}", e)))?;

        match hit.status.as_str() {
            "ok" => {}
            "empty" => return Err(Error::not_interactable("element has no size")),
            _ => {
                return Err(Error::click_intercepted(format!(
                    "point ({:.0}, {:.0}) is covered by {}",
                    hit.x,
                    hit.y,
                    hit.by.as_deref().unwrap_or("another element")
                )))
            }
        }

        debug!("ElementRef::click: native click at ({:.0}, {:.0})", hit.x, hit.y);
        self.dispatch_mouse("mouseMoved", hit.x, hit.y).await?;
        self.dispatch_mouse("mousePressed", hit.x, hit.y).await?;
        self.dispatch_mouse("mouseReleased", hit.x, hit.y).await?;
        Ok(())
    }

    async fn js_click(&self) -> Result<(), Error> {
        self.call("", "this.click();", vec![]).await?;
        Ok(())
    }

    async fn type_text(&self, text: &str) -> Result<(), Error> {
        self.call("", "this.focus();", vec![]).await?;

        for ch in text.chars() {
            self.cdp_client
                .call_method(
                    "Input.dispatchKeyEvent",
                    json!({ "type": "char", "text": ch.to_string() }),
                )
                .await?;
        }
        Ok(())
    }

    async fn scroll_into_view(&self) -> Result<(), Error> {
        self.call("", "this.scrollIntoView({ block: 'center', inline: 'center' });", vec![])
            .await?;
        Ok(())
    }

    async fn is_displayed(&self) -> Result<bool, Error> {
        self.call_bool(
            r#"if (!(this instanceof Element)) { return true; }
            if (typeof this.checkVisibility === 'function') {
                if (!this.checkVisibility({ checkOpacity: true, checkVisibilityCSS: true })) { return false; }
            } else {
                const s = getComputedStyle(this);
                if (s.display === 'none' || s.visibility === 'hidden') { return false; }
            }
            return this.getClientRects().length > 0;"#,
        )
        .await
    }

    async fn is_enabled(&self) -> Result<bool, Error> {
        self.call_bool("return !(this.disabled === true || (this.hasAttribute && this.hasAttribute('disabled')));")
            .await
    }

    async fn bounding_box(&self) -> Result<BoundingBox, Error> {
        let result = self
            .call(
                "",
                "const r = this.getBoundingClientRect(); return { x: r.x, y: r.y, width: r.width, height: r.height };",
                vec![],
            )
            .await?;
        serde_json::from_value(result.value.unwrap_or_default())
            .map_err(|e| Error::internal(format!("Unexpected bounding box: {}", e)))
    }

    async fn run_script(&self, function_declaration: &str) -> Result<EvaluationResult, Error> {
        let body = format!("return ({}).call(this);", function_declaration);
        let result = self.call("", &body, vec![]).await?;
        Ok(CdpClientImpl::parse_remote_object(&result))
    }
}
