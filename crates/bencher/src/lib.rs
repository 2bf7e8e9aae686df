use std::borrow::Cow;

#[derive(Debug, Clone)]
pub struct TestCase {
    name: &'static str,
    group: TestGroup,
    input: Cow<'static, [u8]>,
}

impl TestCase {
    pub fn from_file(name: &'static str, group: TestGroup, file: TestFile) -> Self {
        Self { name, group, input: Cow::Borrowed(file.content().as_bytes()) }
    }

    /// A case whose input is built by the benchmark, e.g. encoded WebSocket frames.
    pub fn generated(name: &'static str, group: TestGroup, input: Vec<u8>) -> Self {
        Self { name, group, input: Cow::Owned(input) }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn group(&self) -> TestGroup {
        self.group
    }

    pub fn input(&self) -> &[u8] {
        &self.input
    }

    pub fn len(&self) -> u64 {
        self.input.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.input.is_empty()
    }
}

#[derive(Debug, Copy, Clone)]
pub struct TestFile {
    file_name: &'static str,
    content: &'static str,
}

impl TestFile {
    pub const fn new(file_name: &'static str, content: &'static str) -> Self {
        Self { file_name, content }
    }

    pub fn content(&self) -> &'static str {
        self.content
    }

    pub fn file_name(&self) -> &'static str {
        self.file_name
    }
}

#[derive(Clone, Copy, Debug)]
pub enum TestGroup {
    Small,
    Normal,
    Large,
}

impl TestGroup {
    /// Criterion sample size; large inputs take fewer samples.
    pub fn sample_size(self) -> usize {
        match self {
            Self::Small | Self::Normal => 100,
            Self::Large => 20,
        }
    }
}
