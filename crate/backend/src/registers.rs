//! The fixed six-register pool used only for inline-asm placeholder
//! materialization (spec §4.7). Ordinary codegen always addresses `%ac`
//! and `%bs` directly; this pool exists so several `(name)` placeholders
//! in the same `asm [ ... ]` block don't clobber each other.

use boxc_error::FatalError;

const REGISTERS: [&str; 6] = ["%ac", "%bs", "%cn", "%dc", "%dt", "%di"];

#[derive(Debug, Default)]
pub struct RegisterPool {
    in_use: Vec<&'static str>,
}

impl RegisterPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&mut self) -> Result<&'static str, FatalError> {
        let reg = REGISTERS
            .iter()
            .copied()
            .find(|r| !self.in_use.contains(r))
            .ok_or(FatalError::RegisterPoolExhausted)?;
        self.in_use.push(reg);
        Ok(reg)
    }

    pub fn release(&mut self, reg: &'static str) {
        self.in_use.retain(|r| *r != reg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_gives_distinct_registers() {
        let mut pool = RegisterPool::new();
        let a = pool.acquire().unwrap();
        let b = pool.acquire().unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn exhausting_the_pool_is_a_fatal_error() {
        let mut pool = RegisterPool::new();
        for _ in 0..6 {
            pool.acquire().unwrap();
        }
        assert!(matches!(pool.acquire(), Err(FatalError::RegisterPoolExhausted)));
    }

    #[test]
    fn released_register_can_be_reacquired() {
        let mut pool = RegisterPool::new();
        let mut taken = Vec::new();
        for _ in 0..6 {
            taken.push(pool.acquire().unwrap());
        }
        pool.release(taken[0]);
        assert_eq!(pool.acquire().unwrap(), taken[0]);
    }
}
