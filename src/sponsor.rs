//! Sponsored transaction protocol.
//!
//! A zero-balance account submits a transaction whose gas is paid by a
//! sponsor. The protocol advances through typed states:
//!
//! ```text
//! BuiltTransaction --sponsor--> SponsoredTransaction --sign--> SignedTransaction --execute--> ExecutedTransaction
//! ```
//!
//! Each transition consumes the previous state, so a stage cannot be run
//! twice. Nothing is retried; a caller retries by building again.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::encoding::{from_base64, to_base64};
use crate::transaction::{format_address, parse_address, verify_sponsored_transaction, GasData, TransactionData};
use crate::types::{Result, SponsorError, SponsorshipStage, SuiChatError, ADDRESS_SIZE};
use crate::wallet::TransactionSigner;

/// Body of the sponsor build request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SponsorRequest {
    /// Base64 of the gas-free transaction kind.
    #[serde(rename = "txBytes")]
    pub transaction_kind_bytes: String,
    /// Sender address bound into the transaction.
    pub sender: String,
}

/// Body of a successful sponsor build response.
///
/// Fields are optional so that an incomplete response can be reported
/// instead of failing to parse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SponsorResponse {
    #[serde(rename = "txBytes", default)]
    pub transaction_bytes: Option<String>,
    #[serde(default)]
    pub digest: Option<String>,
}

/// Body of the execute request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteRequest {
    pub digest: String,
    pub user_signature: String,
}

/// Body of the execute response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecuteResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub digest: Option<String>,
    #[serde(default)]
    pub effects: Option<serde_json::Value>,
    #[serde(default)]
    pub events: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
}

/// Trait for the remote gas sponsor.
///
/// Implementations return `SuiChatError::Sponsor` for transport failures and
/// non-success statuses; payload validation is done by the caller.
#[async_trait::async_trait]
pub trait SponsorBackend: Send + Sync {
    /// Ask the sponsor to attach gas to a transaction kind.
    async fn sponsor(&self, request: &SponsorRequest) -> Result<SponsorResponse>;

    /// Submit the user's signature to finalize a sponsored transaction.
    async fn execute(&self, request: &ExecuteRequest) -> Result<ExecuteResponse>;
}

/// Unsigned, gas-free transaction kind bound to its sender.
#[derive(Debug, Clone)]
pub struct BuiltTransaction {
    kind_bytes: Vec<u8>,
    sender: String,
    sender_bytes: [u8; ADDRESS_SIZE],
}

impl BuiltTransaction {
    /// Binds BCS-encoded transaction kind bytes to a sender address.
    pub fn new(kind_bytes: Vec<u8>, sender: &str) -> Result<Self> {
        if kind_bytes.is_empty() {
            return Err(SuiChatError::MalformedTransaction(
                "transaction kind is empty".to_string(),
            ));
        }
        let sender_bytes = parse_address(sender)?;
        Ok(Self {
            kind_bytes,
            sender: format_address(&sender_bytes),
            sender_bytes,
        })
    }

    pub fn kind_bytes(&self) -> &[u8] {
        &self.kind_bytes
    }

    /// Normalized sender address.
    pub fn sender(&self) -> &str {
        &self.sender
    }

    pub fn request(&self) -> SponsorRequest {
        SponsorRequest {
            transaction_kind_bytes: to_base64(&self.kind_bytes),
            sender: self.sender.clone(),
        }
    }

    /// Send to the sponsor and verify what comes back.
    ///
    /// Fails before any signature is requested if the response lacks
    /// transaction bytes or a digest, or if the returned transaction does not
    /// carry exactly this kind and sender.
    pub async fn sponsor<B: SponsorBackend + ?Sized>(self, backend: &B) -> Result<SponsoredTransaction> {
        debug!(
            sender = %self.sender,
            kind_len = self.kind_bytes.len(),
            "requesting sponsorship"
        );
        let response = backend.sponsor(&self.request()).await?;

        let (encoded, digest) = match (response.transaction_bytes, response.digest) {
            (Some(bytes), Some(digest)) if !bytes.is_empty() && !digest.is_empty() => (bytes, digest),
            (bytes, digest) => {
                return Err(SponsorError::new(
                    SponsorshipStage::Sponsored,
                    format!(
                        "Sponsor response missing txBytes or digest (txBytes present: {}, digest present: {})",
                        bytes.is_some_and(|b| !b.is_empty()),
                        digest.is_some_and(|d| !d.is_empty())
                    ),
                )
                .into())
            }
        };

        let transaction_bytes = from_base64(&encoded).map_err(|e| {
            SponsorError::new(SponsorshipStage::Sponsored, format!("Sponsor returned {}", e))
        })?;

        let data = verify_sponsored_transaction(&transaction_bytes, &self.kind_bytes, &self.sender_bytes)?;

        debug!(
            %digest,
            gas_owner = %format_address(&data.gas_data.owner),
            gas_budget = data.gas_data.budget,
            "sponsored transaction verified"
        );

        Ok(SponsoredTransaction {
            digest,
            transaction_bytes,
            data,
        })
    }
}

/// Transaction with the sponsor's gas attached, verified against what we built.
#[derive(Debug, Clone)]
pub struct SponsoredTransaction {
    digest: String,
    transaction_bytes: Vec<u8>,
    data: TransactionData,
}

impl SponsoredTransaction {
    /// Sponsor's tracking identifier.
    pub fn digest(&self) -> &str {
        &self.digest
    }

    pub fn transaction_bytes(&self) -> &[u8] {
        &self.transaction_bytes
    }

    pub fn gas_data(&self) -> &GasData {
        &self.data.gas_data
    }

    /// Sign the full sponsored bytes, including the sponsor's gas choice.
    pub async fn sign<S: TransactionSigner + ?Sized>(self, signer: &S) -> Result<SignedTransaction> {
        debug!(digest = %self.digest, "requesting user signature");
        let user_signature = signer.sign_transaction(&self.transaction_bytes).await?;

        if user_signature.is_empty() {
            return Err(SuiChatError::SigningRejected(
                "wallet returned an empty signature".to_string(),
            ));
        }

        Ok(SignedTransaction {
            digest: self.digest,
            user_signature,
        })
    }
}

/// Sponsored transaction carrying the user's signature.
#[derive(Debug, Clone)]
pub struct SignedTransaction {
    digest: String,
    user_signature: String,
}

impl SignedTransaction {
    pub fn digest(&self) -> &str {
        &self.digest
    }

    pub fn request(&self) -> ExecuteRequest {
        ExecuteRequest {
            digest: self.digest.clone(),
            user_signature: self.user_signature.clone(),
        }
    }

    /// Hand the signature to the sponsor for co-signing and submission.
    pub async fn execute<B: SponsorBackend + ?Sized>(self, backend: &B) -> Result<ExecutedTransaction> {
        debug!(digest = %self.digest, "submitting for execution");
        let response = backend.execute(&self.request()).await?;

        if !response.success {
            let reason = match (response.error, response.details) {
                (Some(error), Some(details)) => format!("{}: {}", error, details),
                (Some(error), None) => error,
                (None, Some(details)) => details,
                (None, None) => "Execution was not successful".to_string(),
            };
            return Err(SponsorError::new(SponsorshipStage::Executed, reason).into());
        }

        Ok(ExecutedTransaction {
            digest: response.digest.unwrap_or(self.digest),
            effects: response.effects,
            events: response.events,
        })
    }
}

/// Successful on-chain execution.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutedTransaction {
    pub digest: String,
    pub effects: Option<serde_json::Value>,
    pub events: Option<serde_json::Value>,
}

/// Why a sponsorship run stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SponsorshipFailure {
    /// Stage that was being attempted.
    pub stage: SponsorshipStage,
    /// Upstream HTTP status, if any.
    pub status: Option<u16>,
    pub reason: String,
}

impl SponsorshipFailure {
    fn from_error(stage: SponsorshipStage, error: SuiChatError) -> Self {
        match error {
            SuiChatError::Sponsor(e) => Self {
                stage: e.stage,
                status: e.status,
                reason: e.reason,
            },
            other => Self {
                stage,
                status: None,
                reason: other.to_string(),
            },
        }
    }
}

/// Terminal state of a sponsorship run.
#[derive(Debug, Clone, PartialEq)]
pub enum SponsorshipOutcome {
    Executed(ExecutedTransaction),
    Failed(SponsorshipFailure),
}

impl SponsorshipOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SponsorshipOutcome::Executed(_))
    }

    pub fn digest(&self) -> Option<&str> {
        match self {
            SponsorshipOutcome::Executed(tx) => Some(&tx.digest),
            SponsorshipOutcome::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            SponsorshipOutcome::Executed(_) => None,
            SponsorshipOutcome::Failed(failure) => Some(&failure.reason),
        }
    }
}

/// Drives a transaction through build, sponsor, sign and execute.
pub struct SponsorshipCoordinator<B, S>
where
    B: SponsorBackend,
    S: TransactionSigner,
{
    backend: B,
    signer: S,
}

impl<B, S> SponsorshipCoordinator<B, S>
where
    B: SponsorBackend,
    S: TransactionSigner,
{
    pub fn new(backend: B, signer: S) -> Self {
        Self { backend, signer }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn signer(&self) -> &S {
        &self.signer
    }

    /// Run the full protocol for one transaction kind.
    ///
    /// The first failing stage ends the run; nothing is retried.
    pub async fn run(&self, kind_bytes: Vec<u8>, sender: &str) -> SponsorshipOutcome {
        info!(%sender, "starting sponsored transaction");

        match self.drive(kind_bytes, sender).await {
            Ok(executed) => {
                info!(digest = %executed.digest, "sponsored transaction executed");
                SponsorshipOutcome::Executed(executed)
            }
            Err(failure) => {
                warn!(
                    stage = %failure.stage,
                    status = ?failure.status,
                    reason = %failure.reason,
                    "sponsored transaction failed"
                );
                SponsorshipOutcome::Failed(failure)
            }
        }
    }

    async fn drive(
        &self,
        kind_bytes: Vec<u8>,
        sender: &str,
    ) -> std::result::Result<ExecutedTransaction, SponsorshipFailure> {
        let built = BuiltTransaction::new(kind_bytes, sender)
            .map_err(|e| SponsorshipFailure::from_error(SponsorshipStage::Built, e))?;

        let sponsored = built
            .sponsor(&self.backend)
            .await
            .map_err(|e| SponsorshipFailure::from_error(SponsorshipStage::Sponsored, e))?;

        let signed = sponsored
            .sign(&self.signer)
            .await
            .map_err(|e| SponsorshipFailure::from_error(SponsorshipStage::Signed, e))?;

        signed
            .execute(&self.backend)
            .await
            .map_err(|e| SponsorshipFailure::from_error(SponsorshipStage::Executed, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::{ObjectRef, TransactionExpiration};

    #[test]
    fn test_sponsor_request_wire_names() {
        let built = BuiltTransaction::new(vec![1, 2, 3], "0xa11ce").unwrap();
        let json = serde_json::to_value(built.request()).unwrap();
        assert_eq!(json["txBytes"], "AQID");
        assert_eq!(
            json["sender"],
            "0x00000000000000000000000000000000000000000000000000000000000a11ce"
        );
    }

    #[test]
    fn test_execute_request_wire_names() {
        let request = ExecuteRequest {
            digest: "D1".into(),
            user_signature: "U0lH".into(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["digest"], "D1");
        assert_eq!(json["userSignature"], "U0lH");
    }

    #[test]
    fn test_responses_tolerate_missing_fields() {
        let sponsor: SponsorResponse = serde_json::from_str(r#"{"digest":"D1"}"#).unwrap();
        assert_eq!(sponsor.transaction_bytes, None);
        assert_eq!(sponsor.digest.as_deref(), Some("D1"));

        let execute: ExecuteResponse =
            serde_json::from_str(r#"{"error":"Failed to execute transaction","details":"boom"}"#).unwrap();
        assert!(!execute.success);
        assert_eq!(execute.details.as_deref(), Some("boom"));
    }

    #[test]
    fn test_built_rejects_bad_input() {
        assert!(matches!(
            BuiltTransaction::new(Vec::new(), "0x1"),
            Err(SuiChatError::MalformedTransaction(_))
        ));
        assert!(matches!(
            BuiltTransaction::new(vec![1], "alice"),
            Err(SuiChatError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_failure_keeps_sponsor_stage_and_status() {
        let err = SponsorError::new(SponsorshipStage::Sponsored, "Sponsor failed: 429").with_status(429);
        let failure = SponsorshipFailure::from_error(SponsorshipStage::Sponsored, err.into());
        assert_eq!(failure.stage, SponsorshipStage::Sponsored);
        assert_eq!(failure.status, Some(429));

        let failure = SponsorshipFailure::from_error(
            SponsorshipStage::Signed,
            SuiChatError::SigningRejected("no".into()),
        );
        assert_eq!(failure.stage, SponsorshipStage::Signed);
        assert_eq!(failure.status, None);
        assert_eq!(failure.reason, "Signing rejected: no");
    }

    #[test]
    fn test_outcome_accessors() {
        let ok = SponsorshipOutcome::Executed(ExecutedTransaction {
            digest: "D1".into(),
            effects: None,
            events: None,
        });
        assert!(ok.is_success());
        assert_eq!(ok.digest(), Some("D1"));
        assert_eq!(ok.error(), None);

        let failed = SponsorshipOutcome::Failed(SponsorshipFailure {
            stage: SponsorshipStage::Executed,
            status: Some(500),
            reason: "boom".into(),
        });
        assert!(!failed.is_success());
        assert_eq!(failed.error(), Some("boom"));
    }

    struct StaticBackend {
        transaction_bytes: Vec<u8>,
    }

    #[async_trait::async_trait]
    impl SponsorBackend for StaticBackend {
        async fn sponsor(&self, _request: &SponsorRequest) -> Result<SponsorResponse> {
            Ok(SponsorResponse {
                transaction_bytes: Some(to_base64(&self.transaction_bytes)),
                digest: Some("D1".into()),
            })
        }

        async fn execute(&self, request: &ExecuteRequest) -> Result<ExecuteResponse> {
            Ok(ExecuteResponse {
                success: request.user_signature == "sig",
                error: Some("bad signature".into()),
                ..Default::default()
            })
        }
    }

    struct StaticSigner(&'static str);

    #[async_trait::async_trait]
    impl TransactionSigner for StaticSigner {
        async fn sign_transaction(&self, _transaction_bytes: &[u8]) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    fn sponsored_bytes(kind: &[u8], sender: &str) -> Vec<u8> {
        TransactionData {
            kind: kind.to_vec(),
            sender: parse_address(sender).unwrap(),
            gas_data: GasData {
                payment: vec![ObjectRef {
                    object_id: [1; 32],
                    version: 1,
                    digest: [2; 32],
                }],
                owner: [3; 32],
                price: 750,
                budget: 5_000_000,
            },
            expiration: TransactionExpiration::None,
        }
        .encode()
    }

    #[tokio::test]
    async fn test_typestate_walkthrough() {
        let backend = StaticBackend {
            transaction_bytes: sponsored_bytes(&[9, 9], "0xb0b"),
        };

        let sponsored = BuiltTransaction::new(vec![9, 9], "0xb0b")
            .unwrap()
            .sponsor(&backend)
            .await
            .unwrap();
        assert_eq!(sponsored.digest(), "D1");
        assert_eq!(sponsored.gas_data().price, 750);

        let signed = sponsored.sign(&StaticSigner("sig")).await.unwrap();
        let executed = signed.execute(&backend).await.unwrap();
        assert_eq!(executed.digest, "D1");
    }

    #[tokio::test]
    async fn test_empty_signature_is_rejected() {
        let backend = StaticBackend {
            transaction_bytes: sponsored_bytes(&[9, 9], "0xb0b"),
        };
        let sponsored = BuiltTransaction::new(vec![9, 9], "0xb0b")
            .unwrap()
            .sponsor(&backend)
            .await
            .unwrap();

        let result = sponsored.sign(&StaticSigner("")).await;
        assert!(matches!(result, Err(SuiChatError::SigningRejected(_))));
    }

    #[tokio::test]
    async fn test_unsuccessful_execution_is_failure() {
        let backend = StaticBackend {
            transaction_bytes: sponsored_bytes(&[9, 9], "0xb0b"),
        };
        let coordinator = SponsorshipCoordinator::new(backend, StaticSigner("wrong"));

        let outcome = coordinator.run(vec![9, 9], "0xb0b").await;
        match outcome {
            SponsorshipOutcome::Failed(failure) => {
                assert_eq!(failure.stage, SponsorshipStage::Executed);
                assert_eq!(failure.reason, "bad signature");
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }
}
