use k256::ecdsa::SigningKey;
use rand_core::OsRng;
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::error::RtmError;
use crate::network::RtmNetwork;

/// Trailing WIF byte marking a key whose public key is serialized compressed.
const WIF_COMPRESSED_FLAG: u8 = 0x01;

/// A freshly generated key together with the address it controls.
pub struct KeyPair {
    pub address: String,
    /// WIF-encoded private key.
    pub wif: Zeroizing<String>,
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("address", &self.address)
            .field("wif", &"<redacted>")
            .finish()
    }
}

/// A private key decoded from its WIF string.
pub struct DecodedWif {
    pub secret: Zeroizing<[u8; 32]>,
    pub compressed: bool,
}

/// Compute Hash160 (RIPEMD-160(SHA-256(data))).
pub fn hash160(data: &[u8]) -> [u8; 20] {
    let sha = Sha256::digest(data);
    Ripemd160::digest(sha).into()
}

/// Derive a P2PKH address from a serialized secp256k1 public key.
///
/// Accepts 33-byte compressed (`02`/`03`) or 65-byte uncompressed (`04`)
/// SEC1 encodings. The address is Base58Check over
/// `pubkey_hash_version || hash160(pubkey)`.
pub fn pubkey_to_address(pubkey: &[u8], network: RtmNetwork) -> Result<String, RtmError> {
    match (pubkey.len(), pubkey.first()) {
        (33, Some(0x02 | 0x03)) | (65, Some(0x04)) => {}
        (len, _) => {
            return Err(RtmError::InvalidPublicKey(format!(
                "expected SEC1 compressed or uncompressed key, got {len} bytes"
            )))
        }
    }

    let mut payload = Vec::with_capacity(21);
    payload.push(network.params().pubkey_hash);
    payload.extend_from_slice(&hash160(pubkey));

    Ok(bs58::encode(payload).with_check().into_string())
}

/// Decode a WIF string, checking its version byte against `network`.
pub fn decode_wif(wif: &str, network: RtmNetwork) -> Result<DecodedWif, RtmError> {
    let decoded = Zeroizing::new(
        bs58::decode(wif.trim())
            .with_check(None)
            .into_vec()
            .map_err(|e| RtmError::InvalidPrivateKey(format!("invalid base58check: {e}")))?,
    );

    let compressed = match decoded.len() {
        33 => false,
        34 if decoded[33] == WIF_COMPRESSED_FLAG => true,
        len => {
            return Err(RtmError::InvalidPrivateKey(format!(
                "unexpected WIF payload length {len}"
            )))
        }
    };

    let expected = network.params().wif;
    if decoded[0] != expected {
        return Err(RtmError::InvalidPrivateKey(format!(
            "WIF version 0x{:02x} does not belong to {network} (expected 0x{expected:02x})",
            decoded[0]
        )));
    }

    let mut secret = Zeroizing::new([0u8; 32]);
    secret.copy_from_slice(&decoded[1..33]);
    Ok(DecodedWif { secret, compressed })
}

/// Encode a 32-byte private key as WIF for `network`.
pub fn encode_wif(secret: &[u8; 32], compressed: bool, network: RtmNetwork) -> Zeroizing<String> {
    let mut payload = Zeroizing::new(Vec::with_capacity(34));
    payload.push(network.params().wif);
    payload.extend_from_slice(secret);
    if compressed {
        payload.push(WIF_COMPRESSED_FLAG);
    }
    Zeroizing::new(bs58::encode(payload.as_slice()).with_check().into_string())
}

/// Serialized public key for a raw private key.
fn public_key_bytes(secret: &[u8; 32], compressed: bool) -> Result<Vec<u8>, RtmError> {
    let signing_key = SigningKey::from_slice(secret)
        .map_err(|e| RtmError::InvalidPrivateKey(format!("not a valid secp256k1 scalar: {e}")))?;
    Ok(signing_key
        .verifying_key()
        .to_encoded_point(compressed)
        .as_bytes()
        .to_vec())
}

/// Derive the P2PKH address controlled by a WIF-encoded private key.
pub fn address_from_wif(wif: &str, network: RtmNetwork) -> Result<String, RtmError> {
    let decoded = decode_wif(wif, network)?;
    let pubkey = public_key_bytes(&decoded.secret, decoded.compressed)?;
    pubkey_to_address(&pubkey, network)
}

/// Generate a random key pair for `network`.
///
/// The key uses a compressed public key, so its WIF carries the compression
/// flag and `address_from_wif(wif)` yields the same address.
pub fn generate_key_pair(network: RtmNetwork) -> Result<KeyPair, RtmError> {
    let signing_key = SigningKey::random(&mut OsRng);
    let secret: Zeroizing<[u8; 32]> = Zeroizing::new(signing_key.to_bytes().into());

    let pubkey = signing_key.verifying_key().to_encoded_point(true);
    let address = pubkey_to_address(pubkey.as_bytes(), network)?;
    let wif = encode_wif(&secret, true, network);

    Ok(KeyPair { address, wif })
}

/// Validate an address string for the given network.
///
/// Returns `Ok(true)` for a well-formed P2PKH or P2SH address of `network`,
/// `Ok(false)` for a well-formed address of another version, and an error
/// when the string is not Base58Check at all.
pub fn validate_address(address: &str, network: RtmNetwork) -> Result<bool, RtmError> {
    let decoded = bs58::decode(address)
        .with_check(None)
        .into_vec()
        .map_err(|e| RtmError::InvalidAddress(format!("invalid base58check: {e}")))?;

    if decoded.len() != 21 {
        return Err(RtmError::InvalidAddress(format!(
            "expected 21-byte payload, got {}",
            decoded.len()
        )));
    }

    let params = network.params();
    Ok(decoded[0] == params.pubkey_hash || decoded[0] == params.script_hash)
}
