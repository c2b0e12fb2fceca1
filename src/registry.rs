use std::convert::TryFrom;
use std::sync::Arc;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use http::header::{ACCEPT, CONTENT_TYPE};
use http::{header, HeaderValue, Method, Request};
use hyper::Client;
use hyper_trust_dns_connector::{new_async_http_connector, AsyncHyperResolver};
use tokio::sync::Mutex;
use tower::{Service, ServiceBuilder, ServiceExt};
use tower_http::classify::StatusInRangeAsFailures;
use tower_http::decompression::DecompressionLayer;
use tower_http::follow_redirect::FollowRedirectLayer;
use tower_http::set_header::SetRequestHeaderLayer;
use tower_http::trace::{Trace, TraceLayer};

use crate::descriptor::{
    Descriptor, MEDIA_TYPE_DOCKER_INDEX, MEDIA_TYPE_DOCKER_MANIFEST, MEDIA_TYPE_OCI_INDEX,
    MEDIA_TYPE_OCI_MANIFEST,
};
use crate::digest::Digest;
use crate::metadata;
use crate::reference::{Locator, NamedReference};
use crate::resolver::{Fetcher, Resolver};

const USER_AGENT: &str = const_format::formatcp!(
    "{}/{} ({})",
    metadata::NAME,
    metadata::VERSION,
    metadata::HOMEPAGE
);

type HyperService = Trace<
    tower_http::set_header::request::SetRequestHeader<
        tower_http::decompression::Decompression<
            tower_http::follow_redirect::FollowRedirect<
                hyper::client::Client<
                    hyper_rustls::HttpsConnector<hyper::client::connect::HttpConnector<AsyncHyperResolver>>,
                >,
            >,
        >,
        HeaderValue,
    >,
    tower_http::classify::SharedClassifier<StatusInRangeAsFailures>,
>;

fn build_client() -> anyhow::Result<Arc<Mutex<HyperService>>> {
    let mut http = new_async_http_connector().context("could not build async http connector")?;
    http.enforce_http(false);
    let https = hyper_rustls::HttpsConnectorBuilder::new()
        .with_native_roots()
        .https_or_http()
        .enable_http1()
        .enable_http2()
        .wrap_connector(http);

    let hyper = Client::builder().build::<_, hyper::Body>(https);

    let client = ServiceBuilder::new()
        .layer(TraceLayer::new(
            StatusInRangeAsFailures::new(400..=599).into_make_classifier(),
        ))
        .layer(SetRequestHeaderLayer::overriding(
            header::USER_AGENT,
            HeaderValue::from_static(USER_AGENT),
        ))
        .layer(DecompressionLayer::new())
        .layer(FollowRedirectLayer::new())
        .service(hyper);

    Ok(Arc::new(Mutex::new(client)))
}

struct Response {
    bytes: Vec<u8>,
    content_type: String,
}

async fn get(
    client: &Arc<Mutex<HyperService>>,
    url: &str,
    accept: &[&str],
) -> anyhow::Result<Response> {
    let mut builder = Request::builder().uri(url).method(Method::GET);
    {
        let headers = builder.headers_mut().unwrap();
        for header in accept {
            headers.insert(ACCEPT, HeaderValue::from_str(header)?);
        }
    }
    let request = builder.body(hyper::Body::empty())?;

    log::debug!("downloading `{} {}`", request.method(), request.uri());
    let mut client = client.lock().await;
    let ready = client.ready().await?;
    let response = ready.call(request).await?;

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .map(|v| v.to_str().unwrap_or_default().to_string())
        .unwrap_or_default();

    let status = response.status();
    if !status.is_success() {
        return Err(anyhow!("received unsuccessful response status `{}`", status));
    }

    let bytes = hyper::body::to_bytes(response.into_body()).await?;
    Ok(Response {
        bytes: bytes.to_vec(),
        content_type,
    })
}

/// `Resolver`/`Fetcher` implementation over a small tower/hyper pipeline.
/// Performs anonymous GETs against a registry's HTTP API; authentication
/// and token flows are out of scope (spec.md §1) and are not implemented.
pub struct HttpRegistry {
    client: Arc<Mutex<HyperService>>,
}

impl HttpRegistry {
    pub fn new() -> anyhow::Result<Self> {
        Ok(HttpRegistry {
            client: build_client()?,
        })
    }
}

#[async_trait]
impl Resolver for HttpRegistry {
    async fn resolve(&self, reference: &NamedReference) -> anyhow::Result<Descriptor> {
        let url = format!(
            "https://{}/v2/{}/manifests/{}",
            reference.registry, reference.name, reference.locator
        );

        let response = get(
            &self.client,
            &url,
            &[
                MEDIA_TYPE_OCI_MANIFEST,
                MEDIA_TYPE_OCI_INDEX,
                MEDIA_TYPE_DOCKER_MANIFEST,
                MEDIA_TYPE_DOCKER_INDEX,
            ],
        )
        .await
        .with_context(|| format!("could not resolve `{}`", reference.to_string()))?;

        let digest = match &reference.locator {
            Locator::Digest(d) => Digest::try_from(d.as_str())?,
            Locator::Tag(_) => Digest::of(crate::digest::Algorithm::Sha256, &response.bytes),
        };

        Ok(Descriptor {
            media_type: response.content_type,
            digest,
            size: response.bytes.len() as u64,
            platform: None,
            annotations: None,
        })
    }

    async fn fetcher(&self, reference: &NamedReference) -> anyhow::Result<Arc<dyn Fetcher>> {
        Ok(Arc::new(HttpFetcher {
            client: self.client.clone(),
            registry: reference.registry.clone(),
            name: reference.name.clone(),
        }))
    }
}

struct HttpFetcher {
    client: Arc<Mutex<HyperService>>,
    registry: String,
    name: String,
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, digest: &Digest) -> anyhow::Result<Vec<u8>> {
        let manifest_url = format!(
            "https://{}/v2/{}/manifests/{}",
            self.registry, self.name, digest
        );
        let blob_url = format!("https://{}/v2/{}/blobs/{}", self.registry, self.name, digest);

        // A digest may address either a manifest or a blob; try the
        // manifest endpoint first since that's what the traverser fetches
        // most of (config/layers are a minority of calls in practice).
        let response = match get(
            &self.client,
            &manifest_url,
            &[
                MEDIA_TYPE_OCI_MANIFEST,
                MEDIA_TYPE_OCI_INDEX,
                MEDIA_TYPE_DOCKER_MANIFEST,
                MEDIA_TYPE_DOCKER_INDEX,
            ],
        )
        .await
        {
            Ok(response) => response,
            Err(_) => get(&self.client, &blob_url, &[]).await?,
        };

        if !digest.verify(&response.bytes) {
            return Err(anyhow!(
                "digest mismatch for `{}`: content does not hash to the requested digest",
                digest
            ));
        }

        Ok(response.bytes)
    }
}
