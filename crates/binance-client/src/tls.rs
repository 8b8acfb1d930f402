//! TLS 신뢰 설정.
//!
//! REST 클라이언트와 WebSocket 세션이 같은 `rustls::ClientConfig`를 공유합니다.
//! 호출자가 PEM 번들을 지정한 경우 그 번들의 인증서만 신뢰 앵커로 사용하며,
//! 파일이 없거나 읽을 수 없거나 인증서가 하나도 없으면 생성 단계에서 실패합니다.

use crate::{ClientError, ClientResult};
use binance_core::ClientSettings;
use rustls::pki_types::CertificateDer;
use rustls::{ClientConfig, RootCertStore};
use std::fmt;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_tungstenite::Connector;
use tracing::debug;

/// 신뢰 앵커 출처.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrustSource {
    /// 내장 webpki 루트 인증서
    WebPkiRoots,
    /// 호출자가 지정한 PEM 번들
    PemBundle(Option<PathBuf>),
}

/// REST와 스트리밍 연결에 공통으로 쓰이는 TLS 신뢰 설정.
#[derive(Clone)]
pub struct TlsTrust {
    config: Arc<ClientConfig>,
    source: TrustSource,
}

impl fmt::Debug for TlsTrust {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TlsTrust")
            .field("source", &self.source)
            .finish()
    }
}

impl TlsTrust {
    /// 내장 webpki 루트 인증서로 생성합니다.
    pub fn webpki_roots() -> ClientResult<Self> {
        let mut roots = RootCertStore::empty();
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

        Ok(Self {
            config: Arc::new(build_client_config(roots)?),
            source: TrustSource::WebPkiRoots,
        })
    }

    /// PEM 파일에서 신뢰 앵커를 로드합니다.
    ///
    /// # Errors
    /// 파일이 없거나, 인증서가 없거나, 유효하지 않은 인증서가 포함된 경우 `ClientError::Tls`.
    pub fn from_pem_file(path: impl AsRef<Path>) -> ClientResult<Self> {
        let path = path.as_ref();
        let pem = std::fs::read(path).map_err(|e| {
            ClientError::Tls(format!("인증서 번들을 읽을 수 없음 {}: {}", path.display(), e))
        })?;

        let mut trust = Self::from_pem_bytes(&pem)?;
        trust.source = TrustSource::PemBundle(Some(path.to_path_buf()));
        debug!(path = %path.display(), "Loaded TLS trust anchors");
        Ok(trust)
    }

    /// 메모리상의 PEM 번들에서 신뢰 앵커를 로드합니다.
    pub fn from_pem_bytes(pem: &[u8]) -> ClientResult<Self> {
        let mut reader = BufReader::new(pem);
        let certs: Vec<CertificateDer<'static>> = rustls_pemfile::certs(&mut reader)
            .collect::<Result<_, _>>()
            .map_err(|e| ClientError::Tls(format!("PEM 파싱 실패: {}", e)))?;

        if certs.is_empty() {
            return Err(ClientError::Tls(
                "인증서 번들에 인증서가 없습니다".to_string(),
            ));
        }

        let mut roots = RootCertStore::empty();
        for cert in certs {
            roots
                .add(cert)
                .map_err(|e| ClientError::Tls(format!("유효하지 않은 인증서: {}", e)))?;
        }

        Ok(Self {
            config: Arc::new(build_client_config(roots)?),
            source: TrustSource::PemBundle(None),
        })
    }

    /// 설정의 `certificate_path`를 따르고, 지정되지 않았으면 webpki 루트를 사용합니다.
    pub fn from_settings(settings: &ClientSettings) -> ClientResult<Self> {
        match &settings.certificate_path {
            Some(path) => Self::from_pem_file(path),
            None => Self::webpki_roots(),
        }
    }

    /// 신뢰 앵커 출처.
    pub fn source(&self) -> &TrustSource {
        &self.source
    }

    /// 공유 rustls 설정.
    pub fn client_config(&self) -> Arc<ClientConfig> {
        Arc::clone(&self.config)
    }

    /// WebSocket 핸드셰이크용 커넥터.
    pub(crate) fn connector(&self) -> Connector {
        Connector::Rustls(self.client_config())
    }
}

fn build_client_config(roots: RootCertStore) -> ClientResult<ClientConfig> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let config = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| ClientError::Tls(e.to_string()))?
        .with_root_certificates(roots)
        .with_no_client_auth();
    Ok(config)
}
