use num_enum::{IntoPrimitive, TryFromPrimitive};

// Only used to name etypes in log output. Whatever etype a client sends is
// reported as is, known to this list or not.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(i32)]
pub enum EncryptionType {
    DES_CBC_CRC = 1,
    DES_CBC_MD4 = 2,
    DES_CBC_MD5 = 3,
    DES3_CBC_MD5 = 5,
    DES3_CBC_SHA1 = 7,
    DES3_CBC_SHA1_KD = 16,
    AES128_CTS_HMAC_SHA1_96 = 17,
    AES256_CTS_HMAC_SHA1_96 = 18,
    AES128_CTS_HMAC_SHA256_128 = 19,
    AES256_CTS_HMAC_SHA384_192 = 20,
    RC4_HMAC = 23,
    RC4_HMAC_EXP = 24,
    CAMELLIA128_CTS_CMAC = 25,
    CAMELLIA256_CTS_CMAC = 26,
    // Microsoft private etypes, seen in the etype list of Windows clients.
    RC4_MD4 = -128,
    RC4_HMAC_OLD = -133,
    RC4_HMAC_OLD_EXP = -135,
    RC4_PLAIN = -140,
    RC4_PLAIN_EXP = -141,
}
