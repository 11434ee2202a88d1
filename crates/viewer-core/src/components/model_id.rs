/// モデル識別子
/// Scene Registry内で一意な表示名。ピック結果との照合にも使う
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelId {
    value: String,
}

impl ModelId {
    /// 新しいModelIdを作成
    pub fn new(id: impl Into<String>) -> Self {
        Self { value: id.into() }
    }

    /// IDを文字列スライスとして取得
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// 使用済みでないIDを生成する
    ///
    /// `base`が空いていればそのまま、使われていれば`base1`, `base2`, ...の
    /// うち最初に空いているものを返す
    pub fn unique(base: &str, is_taken: impl Fn(&str) -> bool) -> Self {
        if !is_taken(base) {
            return Self::new(base);
        }

        let mut counter: u64 = 1;
        loop {
            let candidate = format!("{base}{counter}");
            if !is_taken(&candidate) {
                return Self::new(candidate);
            }
            counter += 1;
        }
    }
}

impl std::fmt::Display for ModelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl From<&str> for ModelId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ModelId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl std::borrow::Borrow<str> for ModelId {
    fn borrow(&self) -> &str {
        &self.value
    }
}
