//! Signature capability doubles for frame tests

use uic_core::UicResult;
use uic_security::{SignatureVerifier, Signer};

mockall::mock! {
    pub Signer {}
    impl Signer for Signer {
        fn sign(&self, data: &[u8]) -> UicResult<Vec<u8>>;
        fn algorithm_oid(&self) -> String;
    }
}

mockall::mock! {
    pub Verifier {}
    impl SignatureVerifier for Verifier {
        fn verify(
            &self,
            signature_der: &[u8],
            data: &[u8],
            public_key: &[u8],
            algorithm_oid: &str,
        ) -> UicResult<bool>;
    }
}
