/// Sums the data as big endian 16 bit words, padding a trailing odd byte with zero.
/// The result is not folded.
pub fn ones_complement_sum(data: &[u8]) -> u32 {
    let mut chunks = data.chunks_exact(2);
    let mut sum = chunks.by_ref().fold(0u32, |acc, word| {
        acc + u32::from(u16::from_be_bytes([word[0], word[1]]))
    });
    if let [last] = chunks.remainder() {
        sum += u32::from(*last) << 8;
    }
    sum
}

/// Folds carries back into the low 16 bits until none remain
pub fn fold_sum(mut sum: u32) -> u16 {
    while sum > 0xFFFF {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }
    sum as u16
}

/// The Internet checksum (RFC 1071): ones-complement of the ones-complement sum of all
/// 16 bit words. The caller is responsible for zeroing the checksum field beforehand.
pub fn internet_checksum(data: &[u8]) -> u16 {
    !fold_sum(ones_complement_sum(data))
}
