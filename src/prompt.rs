//! One-time MFA code input.

pub trait MfaPrompt: Send + Sync {
    /// Ask for a code for `account` using the device `mfa_arn`. Blocks until answered.
    fn prompt(&self, account: &str, mfa_arn: &str) -> Result<String, crate::error::Error>;
}

/// Prompts on standard output and reads a line from standard input.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdioPrompt;

impl MfaPrompt for StdioPrompt {
    fn prompt(&self, account: &str, mfa_arn: &str) -> Result<String, crate::error::Error> {
        let stdin = std::io::stdin();
        let stdout = std::io::stdout();
        read_code(account, mfa_arn, &mut stdin.lock(), &mut stdout.lock())
    }
}

fn read_code<R, W>(
    account: &str,
    mfa_arn: &str,
    input: &mut R,
    output: &mut W,
) -> Result<String, crate::error::Error>
where
    R: std::io::BufRead,
    W: std::io::Write,
{
    writeln!(output, "Enter MFA token code for {account} using {mfa_arn}")?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(crate::error::Error::Unknown(format!(
            "standard input closed while waiting for MFA code for {account}"
        )));
    }
    Ok(line.trim_end().to_owned())
}
