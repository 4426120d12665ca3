use super::key::WORD_LEN;

/// Bytes per vector block in the AVX2 scanner.
pub const BLOCK: usize = 32;

/// Which scanner the readers run. Picked once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanImpl {
    Scalar,
    #[cfg(target_arch = "x86_64")]
    Avx2,
}

impl ScanImpl {
    /// Fastest implementation the CPU supports.
    pub fn detect() -> Self {
        #[cfg(target_arch = "x86_64")]
        {
            if is_x86_feature_detected!("avx2") {
                return ScanImpl::Avx2;
            }
        }
        ScanImpl::Scalar
    }

    pub fn name(self) -> &'static str {
        match self {
            ScanImpl::Scalar => "scalar",
            #[cfg(target_arch = "x86_64")]
            ScanImpl::Avx2 => "avx2",
        }
    }

    /// Calls `on_word(i)` for every line starting in `[s, e)` whose first five
    /// bytes are lowercase letters followed by a non-letter (or the end of
    /// `buf`). `s` must be a line start; lines may be read past `e`.
    /// A letter run that does not start its line is ignored, so `1abcde`
    /// yields nothing.
    #[inline]
    pub fn scan<F: FnMut(usize)>(self, buf: &[u8], s: usize, e: usize, on_word: &mut F) {
        debug_assert!(s <= e && e <= buf.len());
        match self {
            ScanImpl::Scalar => scan_scalar(buf, s, e, on_word),
            #[cfg(target_arch = "x86_64")]
            ScanImpl::Avx2 => {
                // SAFETY: `Avx2` is only constructed after the runtime feature check
                let s = unsafe { scan_avx2(buf, s, e, on_word) };
                scan_scalar(buf, s, e, on_word);
            }
        }
    }
}

#[inline(always)]
fn is_lower(c: u8) -> bool {
    c.is_ascii_lowercase()
}

/// Leading letters of the line at `s` form a five-letter word.
#[inline(always)]
fn five_at(buf: &[u8], s: usize) -> bool {
    let run = buf[s..]
        .iter()
        .take(WORD_LEN + 1)
        .take_while(|&&c| is_lower(c))
        .count();
    run == WORD_LEN
}

/// Index of the first newline in `buf[from..to]`.
#[inline(always)]
fn next_newline(buf: &[u8], from: usize, to: usize) -> Option<usize> {
    buf[from..to].iter().position(|&c| c == b'\n').map(|i| from + i)
}

/// Byte-at-a-time scanner.
pub fn scan_scalar<F: FnMut(usize)>(buf: &[u8], mut s: usize, e: usize, on_word: &mut F) {
    while s < e {
        if five_at(buf, s) {
            on_word(s);
        }
        match next_newline(buf, s, buf.len()) {
            Some(nl) => s = nl + 1,
            None => break,
        }
    }
}

/// Vector scanner over 32-byte blocks lying fully inside `[s, e)`.
/// Returns the line start where the scalar tail must pick up.
#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn scan_avx2<F: FnMut(usize)>(buf: &[u8], mut s: usize, e: usize, on_word: &mut F) -> usize {
    use std::arch::x86_64::*;

    unsafe {
        let nvec = _mm256_set1_epi8(b'\n' as i8);
        let avec = _mm256_set1_epi8(b'a' as i8);
        let zvec = _mm256_set1_epi8(b'z' as i8);

        while s + BLOCK <= e {
            let wvec = _mm256_loadu_si256(buf.as_ptr().add(s) as *const __m256i);

            // newlines, and everything outside a..=z (bytes >= 0x80 compare negative)
            let nmask = _mm256_movemask_epi8(_mm256_cmpeq_epi8(nvec, wvec)) as u32;
            let wmask = _mm256_movemask_epi8(_mm256_or_si256(
                _mm256_cmpgt_epi8(avec, wvec),
                _mm256_cmpgt_epi8(wvec, zvec),
            )) as u32;

            // line longer than a block
            if nmask == 0 {
                if wmask.trailing_zeros() == WORD_LEN as u32 {
                    on_word(s);
                }
                match next_newline(buf, s + BLOCK, e) {
                    Some(nl) => s = nl + 1,
                    None => return e,
                }
                continue;
            }

            // every line that ends inside this block
            let mut pos = 0u32;
            for _ in 0..nmask.count_ones() {
                if (wmask >> pos).trailing_zeros() == WORD_LEN as u32 {
                    on_word(s + pos as usize);
                }
                pos += (nmask >> pos).trailing_zeros() + 1;
            }
            s += pos as usize;
        }
        s
    }
}
