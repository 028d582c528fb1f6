use super::tlv::DecodedField;
use bitmask_enum::bitmask;
use der::Tag;

/// ```text
/// KerberosFlags   ::= BIT STRING (SIZE (32..MAX))
///                     -- minimum number of bits shall be sent,
///                     -- but no fewer than 32
/// KDCOptions      ::= KerberosFlags
/// ````
// Bit 0 on the wire is the most significant bit of the first octet, so the
// value is reversed to keep `1 << n` meaning flag number n.
#[bitmask(u32)]
pub enum KerberosFlags {
    Reserved = 1 << 0,
    Forwardable = 1 << 1,
    Forwarded = 1 << 2,
    Proxiable = 1 << 3,
    Proxy = 1 << 4,
    AllowPostdate = 1 << 5,
    Postdated = 1 << 6,
    Unused7 = 1 << 7,
    Renewable = 1 << 8,
    Unused9 = 1 << 9,
    Unused10 = 1 << 10,
    OptHardwareAuth = 1 << 11,
    Unused12 = 1 << 12,
    Unused13 = 1 << 13,
    Unused14 = 1 << 14,
    Canonicalize = 1 << 15,
    Unused16 = 1 << 16,
    Unused17 = 1 << 17,
    Unused18 = 1 << 18,
    Unused19 = 1 << 19,
    Unused20 = 1 << 20,
    Unused21 = 1 << 21,
    Unused22 = 1 << 22,
    Unused23 = 1 << 23,
    Unused24 = 1 << 24,
    Unused25 = 1 << 25,
    // -- 26 was unused in 1510
    DisableTransitedCheck = 1 << 26,
    RenewableOk = 1 << 27,
    EncTktInSkey = 1 << 28,
    Unused29 = 1 << 29,
    Renew = 1 << 30,
    Validate = 1 << 31,
}

impl KerberosFlags {
    fn from_bits(val: u32) -> Self {
        let mut tf = KerberosFlags::none();
        tf.bits = val;
        tf
    }

    /// Read the flags out of a BIT STRING. Senders that trim trailing zero
    /// octets are tolerated, anything past the first 32 bits is ignored.
    pub(crate) fn from_field(field: &DecodedField<'_>) -> Option<Self> {
        if field.tag() != Tag::BitString {
            return None;
        }

        // First content octet is the count of unused bits.
        let (_unused, bits) = field.content().split_first()?;

        let mut octets = [0u8; 4];
        for (dst, src) in octets.iter_mut().zip(bits) {
            *dst = *src;
        }
        let bits = u32::from_be_bytes(octets);

        let mut swap = 0u32;
        for i in 0..32 {
            let on = bits & (1 << i);
            swap |= on >> i << (32 - i - 1);
        }
        Some(KerberosFlags::from_bits(swap))
    }
}

#[cfg(test)]
mod tests {
    use super::KerberosFlags;
    use crate::asn1::tlv::decode;

    #[test]
    fn kerberos_flags_kdc_options() {
        let bytes = hex::decode("03050040810010").expect("Failed to decode sample");
        let field = decode(&bytes).expect("Failed to decode");
        let flags = KerberosFlags::from_field(&field).expect("Failed to decode flags");
        assert_eq!(
            flags,
            KerberosFlags::Forwardable
                | KerberosFlags::Renewable
                | KerberosFlags::Canonicalize
                | KerberosFlags::RenewableOk
        );
    }

    #[test]
    fn kerberos_flags_short_bit_string() {
        // Only the first octet sent, forwardable and proxiable.
        let bytes = hex::decode("03020050").expect("Failed to decode sample");
        let field = decode(&bytes).expect("Failed to decode");
        let flags = KerberosFlags::from_field(&field).expect("Failed to decode flags");
        assert_eq!(flags, KerberosFlags::Forwardable | KerberosFlags::Proxiable);

        let bytes = hex::decode("0401ff").expect("Failed to decode sample");
        let field = decode(&bytes).expect("Failed to decode");
        assert!(KerberosFlags::from_field(&field).is_none());
    }
}
