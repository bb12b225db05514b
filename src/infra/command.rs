//! shell 命令构建
//!
//! 发往远端的命令全部经过这里拼装：用户提供的名称/路径/令牌
//! 一律单引号包裹，无需任何传输即可单测

/// 将一个值包裹为安全的单引号 shell 字面量
///
/// 单引号内除 `'` 外无转义语义，`'` 替换为 `'\''`
pub fn sh_quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for ch in value.chars() {
        if ch == '\'' {
            quoted.push_str("'\\''");
        } else {
            quoted.push(ch);
        }
    }
    quoted.push('\'');
    quoted
}

/// 多步 shell 脚本构建器
///
/// 步骤以 `&&` 连接，fail-fast 模式前置 `set -e`，
/// 第一个失败的步骤终止所有后续步骤
#[derive(Debug, Default)]
pub struct ShellScript {
    steps: Vec<String>,
    fail_fast: bool,
}

impl ShellScript {
    pub fn new() -> Self {
        Self::default()
    }

    /// fail-fast 脚本
    pub fn fail_fast() -> Self {
        Self {
            steps: Vec::new(),
            fail_fast: true,
        }
    }

    /// 追加一个步骤，步骤内容由调用方负责引用安全
    pub fn step(mut self, step: impl Into<String>) -> Self {
        self.steps.push(step.into());
        self
    }

    /// 渲染为单条命令字符串
    pub fn render(&self) -> String {
        let body = self.steps.join(" && ");
        if self.fail_fast {
            format!("set -e && {}", body)
        } else {
            body
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_plain() {
        assert_eq!(sh_quote("hello"), "'hello'");
        assert_eq!(sh_quote("my-repo_1"), "'my-repo_1'");
    }

    #[test]
    fn test_quote_spaces_and_metachars() {
        assert_eq!(sh_quote("a b"), "'a b'");
        assert_eq!(sh_quote("x; rm -rf /"), "'x; rm -rf /'");
        assert_eq!(sh_quote("$(whoami)"), "'$(whoami)'");
        assert_eq!(sh_quote("`id`"), "'`id`'");
        assert_eq!(sh_quote("a && b"), "'a && b'");
    }

    #[test]
    fn test_quote_single_quote() {
        assert_eq!(sh_quote("it's"), "'it'\\''s'");
        assert_eq!(sh_quote("'"), "''\\'''");
    }

    #[test]
    fn test_quote_empty() {
        assert_eq!(sh_quote(""), "''");
    }

    #[test]
    fn test_script_render() {
        let script = ShellScript::new()
            .step("mkdir -p 'projects'")
            .step("cd 'projects'");
        assert_eq!(script.render(), "mkdir -p 'projects' && cd 'projects'");
    }

    #[test]
    fn test_script_fail_fast() {
        let script = ShellScript::fail_fast().step("cd 'repo'").step("git pull");
        assert_eq!(script.render(), "set -e && cd 'repo' && git pull");
    }

}
