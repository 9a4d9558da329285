//! In-memory stand-in for the RedisBloom command set.
//!
//! Bloom filters are emulated with exact sets, so `BF.EXISTS` never reports
//! a false positive. Top-K sketches keep exact counts and report the
//! `k` heaviest items.

use std::collections::{HashMap, HashSet};

use resp_protocol::Value;

const DEFAULT_CAPACITY: i64 = 100;

#[derive(Debug)]
struct Bloom {
    capacity: i64,
    items: HashSet<String>,
}

impl Bloom {
    fn new(capacity: i64) -> Self {
        Self {
            capacity,
            items: HashSet::new(),
        }
    }
}

#[derive(Debug)]
struct TopK {
    k: usize,
    width: i64,
    depth: i64,
    decay: String,
    counts: HashMap<String, i64>,
    top: Vec<String>,
}

impl TopK {
    /// Bump `item` by `incr` and return the item it pushed out of the top list.
    fn incr(&mut self, item: &str, incr: i64) -> Option<String> {
        *self.counts.entry(item.to_string()).or_insert(0) += incr;
        if self.top.iter().any(|t| t == item) {
            return None;
        }
        if self.top.len() < self.k {
            self.top.push(item.to_string());
            return None;
        }
        let (min_idx, min_count) = self
            .top
            .iter()
            .enumerate()
            .map(|(i, t)| (i, self.counts.get(t).copied().unwrap_or(0)))
            .min_by_key(|&(_, c)| c)?;
        if self.counts[item] > min_count {
            Some(std::mem::replace(&mut self.top[min_idx], item.to_string()))
        } else {
            None
        }
    }

    fn sorted(&self) -> Vec<String> {
        let mut top = self.top.clone();
        top.sort_by_key(|t| std::cmp::Reverse(self.counts.get(t).copied().unwrap_or(0)));
        top
    }
}

/// Key space of a mock server.
#[derive(Debug, Default)]
pub struct Emulator {
    blooms: HashMap<String, Bloom>,
    topks: HashMap<String, TopK>,
}

fn err(message: impl Into<String>) -> Value {
    Value::error(message)
}

fn wrong_arity(name: &str) -> Value {
    err(format!(
        "ERR wrong number of arguments for '{}' command",
        name.to_lowercase()
    ))
}

fn bool_int(b: bool) -> Value {
    Value::Integer(i64::from(b))
}

impl Emulator {
    /// Create an empty key space.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run one command. `args[0]` is the command name.
    pub fn apply(&mut self, args: &[String]) -> Value {
        let Some(name) = args.first() else {
            return err("ERR empty command");
        };
        let rest = &args[1..];
        match name.to_uppercase().as_str() {
            "BF.RESERVE" => self.bf_reserve(rest),
            "BF.ADD" => match rest {
                [key, item] => bool_int(self.bloom(key).items.insert(item.clone())),
                _ => wrong_arity(name),
            },
            "BF.MADD" => match rest {
                [key, items @ ..] if !items.is_empty() => {
                    let bloom = self.bloom(key);
                    Value::Array(
                        items
                            .iter()
                            .map(|i| bool_int(bloom.items.insert(i.clone())))
                            .collect(),
                    )
                }
                _ => wrong_arity(name),
            },
            "BF.EXISTS" => match rest {
                [key, item] => bool_int(self.blooms.get(key).is_some_and(|b| b.items.contains(item))),
                _ => wrong_arity(name),
            },
            "BF.MEXISTS" => match rest {
                [key, items @ ..] if !items.is_empty() => {
                    let bloom = self.blooms.get(key);
                    Value::Array(
                        items
                            .iter()
                            .map(|i| bool_int(bloom.is_some_and(|b| b.items.contains(i))))
                            .collect(),
                    )
                }
                _ => wrong_arity(name),
            },
            "BF.INFO" => match rest {
                [key] => match self.blooms.get(key) {
                    Some(bloom) => Value::Array(vec![
                        "Capacity".into(),
                        bloom.capacity.into(),
                        "Size".into(),
                        (bloom.capacity * 8).into(),
                        "Number of filters".into(),
                        Value::Integer(1),
                        "Number of items inserted".into(),
                        (bloom.items.len() as i64).into(),
                        "Expansion rate".into(),
                        Value::Integer(2),
                    ]),
                    None => err("ERR not found"),
                },
                _ => wrong_arity(name),
            },
            "TOPK.RESERVE" => self.topk_reserve(rest),
            "TOPK.ADD" => match rest {
                [key, items @ ..] if !items.is_empty() => match self.topks.get_mut(key) {
                    Some(topk) => expelled(items.iter().map(|i| topk.incr(i, 1))),
                    None => missing_topk(),
                },
                _ => wrong_arity(name),
            },
            "TOPK.INCRBY" => match rest {
                [key, pairs @ ..] if !pairs.is_empty() && pairs.len() % 2 == 0 => {
                    let Some(topk) = self.topks.get_mut(key) else {
                        return missing_topk();
                    };
                    let mut parsed = Vec::with_capacity(pairs.len() / 2);
                    for pair in pairs.chunks(2) {
                        match pair[1].parse::<i64>() {
                            Ok(n) if n > 0 => parsed.push((&pair[0], n)),
                            _ => return err("TopK: invalid increment value"),
                        }
                    }
                    expelled(parsed.into_iter().map(|(i, n)| topk.incr(i, n)))
                }
                _ => wrong_arity(name),
            },
            "TOPK.QUERY" => match rest {
                [key, items @ ..] if !items.is_empty() => match self.topks.get(key) {
                    Some(topk) => Value::Array(
                        items
                            .iter()
                            .map(|i| bool_int(topk.top.contains(i)))
                            .collect(),
                    ),
                    None => missing_topk(),
                },
                _ => wrong_arity(name),
            },
            "TOPK.COUNT" => match rest {
                [key, items @ ..] if !items.is_empty() => match self.topks.get(key) {
                    Some(topk) => Value::Array(
                        items
                            .iter()
                            .map(|i| Value::Integer(topk.counts.get(i).copied().unwrap_or(0)))
                            .collect(),
                    ),
                    None => missing_topk(),
                },
                _ => wrong_arity(name),
            },
            "TOPK.LIST" => match rest {
                [key] => match self.topks.get(key) {
                    Some(topk) => Value::from(topk.sorted()),
                    None => missing_topk(),
                },
                _ => wrong_arity(name),
            },
            "TOPK.INFO" => match rest {
                [key] => match self.topks.get(key) {
                    Some(topk) => Value::Array(vec![
                        "k".into(),
                        (topk.k as i64).into(),
                        "width".into(),
                        topk.width.into(),
                        "depth".into(),
                        topk.depth.into(),
                        "decay".into(),
                        Value::bulk(topk.decay.clone()),
                    ]),
                    None => missing_topk(),
                },
                _ => wrong_arity(name),
            },
            _ => err(format!("ERR unknown command '{name}'")),
        }
    }

    fn bloom(&mut self, key: &str) -> &mut Bloom {
        self.blooms
            .entry(key.to_string())
            .or_insert_with(|| Bloom::new(DEFAULT_CAPACITY))
    }

    fn bf_reserve(&mut self, rest: &[String]) -> Value {
        let [key, error_rate, capacity] = rest else {
            return wrong_arity("BF.RESERVE");
        };
        let rate_ok = error_rate
            .parse::<f64>()
            .is_ok_and(|r| r > 0.0 && r < 1.0);
        if !rate_ok {
            return err("ERR (0 < error rate range < 1)");
        }
        let Ok(capacity) = capacity.parse::<i64>() else {
            return err("ERR bad capacity");
        };
        if capacity <= 0 {
            return err("ERR (capacity should be larger than 0)");
        }
        if self.blooms.contains_key(key) {
            return err("ERR item exists");
        }
        self.blooms.insert(key.clone(), Bloom::new(capacity));
        Value::ok()
    }

    fn topk_reserve(&mut self, rest: &[String]) -> Value {
        let (key, k, width, depth, decay) = match rest {
            [key, k] => (key, k.as_str(), "8", "7", "0.9"),
            [key, k, width, depth, decay] => {
                (key, k.as_str(), width.as_str(), depth.as_str(), decay.as_str())
            }
            _ => return wrong_arity("TOPK.RESERVE"),
        };
        let (Ok(k), Ok(width), Ok(depth)) =
            (k.parse::<usize>(), width.parse::<i64>(), depth.parse::<i64>())
        else {
            return err("TopK: invalid parameters");
        };
        if k == 0 || decay.parse::<f64>().is_err() {
            return err("TopK: invalid parameters");
        }
        if self.topks.contains_key(key) {
            return err("ERR item exists");
        }
        self.topks.insert(
            key.clone(),
            TopK {
                k,
                width,
                depth,
                decay: decay.to_string(),
                counts: HashMap::new(),
                top: Vec::new(),
            },
        );
        Value::ok()
    }
}

fn missing_topk() -> Value {
    err("TopK: key does not exist")
}

fn expelled(results: impl Iterator<Item = Option<String>>) -> Value {
    Value::Array(
        results
            .map(|r| r.map_or(Value::Nil, Value::bulk))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(emu: &mut Emulator, line: &str) -> Value {
        let args: Vec<String> = line.split_whitespace().map(String::from).collect();
        emu.apply(&args)
    }

    #[test]
    fn test_bloom_add_and_exists() {
        let mut emu = Emulator::new();
        assert_eq!(run(&mut emu, "BF.ADD f a"), Value::Integer(1));
        assert_eq!(run(&mut emu, "BF.ADD f a"), Value::Integer(0));
        assert_eq!(run(&mut emu, "BF.EXISTS f a"), Value::Integer(1));
        assert_eq!(run(&mut emu, "BF.EXISTS f b"), Value::Integer(0));
        assert_eq!(run(&mut emu, "BF.EXISTS missing a"), Value::Integer(0));
    }

    #[test]
    fn test_bloom_reserve_twice_fails() {
        let mut emu = Emulator::new();
        assert_eq!(run(&mut emu, "BF.RESERVE f 0.01 1000"), Value::ok());
        assert!(run(&mut emu, "BF.RESERVE f 0.01 1000").is_error());
        assert!(run(&mut emu, "BF.RESERVE g 2 1000").is_error());
    }

    #[test]
    fn test_topk_expels_lightest() {
        let mut emu = Emulator::new();
        assert_eq!(run(&mut emu, "TOPK.RESERVE t 1"), Value::ok());
        assert_eq!(run(&mut emu, "TOPK.ADD t a"), Value::Array(vec![Value::Nil]));
        assert_eq!(
            run(&mut emu, "TOPK.INCRBY t b 5"),
            Value::Array(vec![Value::bulk("a")])
        );
        assert_eq!(run(&mut emu, "TOPK.LIST t"), Value::from(vec!["b"]));
        assert_eq!(
            run(&mut emu, "TOPK.COUNT t a b"),
            Value::Array(vec![Value::Integer(1), Value::Integer(5)])
        );
    }

    #[test]
    fn test_topk_missing_key() {
        let mut emu = Emulator::new();
        assert!(run(&mut emu, "TOPK.ADD nope a").is_error());
        assert!(run(&mut emu, "TOPK.LIST nope").is_error());
    }

    #[test]
    fn test_unknown_command() {
        let mut emu = Emulator::new();
        assert!(run(&mut emu, "FLUSHALL").is_error());
    }
}
