const INSTRUCTIONS_HEAD: &str = "\
You are an experienced code reviewer.
Your task is to review the provided pull request diff and give constructive feedback.

Follow these steps:
1. Identify if the file contains significant logic changes.
2. Summarize the changes in the diff in clear and concise English, within 100 words.
3. Provide actionable suggestions if there are any issues in the code.

Once you have decided on the changes, for any TODOs, create a GitHub issue.
And send the summary of the PR review to the ";

const INSTRUCTIONS_TAIL: &str = " channel on Slack. Slack does not render \
markdown, so send the summary as a plain text message.
Also add the comprehensive review to the PR as a comment.";

/// Compose the assistant's standing instructions for a delivery channel.
///
/// Pure string construction: a fixed template with the channel identifier
/// interpolated exactly once. The text is policy for the remote model, not
/// logic executed here.
///
/// # Examples
///
/// ```
/// use herald_review::compose_instructions;
///
/// let instructions = compose_instructions("C123");
/// assert_eq!(instructions.matches("C123").count(), 1);
/// ```
pub fn compose_instructions(channel_id: &str) -> String {
    format!("{INSTRUCTIONS_HEAD}{channel_id}{INSTRUCTIONS_TAIL}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_appears_exactly_once() {
        let instructions = compose_instructions("C123");
        assert_eq!(instructions.matches("C123").count(), 1);
    }

    #[test]
    fn channel_is_embedded_in_the_delivery_sentence() {
        let instructions = compose_instructions("C123");
        assert!(instructions.contains("send the summary of the PR review to the C123 channel"));
    }

    #[test]
    fn template_covers_the_review_policy() {
        let instructions = compose_instructions("C1");
        assert!(instructions.contains("significant logic changes"));
        assert!(instructions.contains("within 100 words"));
        assert!(instructions.contains("actionable suggestions"));
        assert!(instructions.contains("TODO"));
        assert!(instructions.contains("plain text"));
        assert!(instructions.contains("comprehensive review to the PR as a comment"));
    }

    #[test]
    fn composition_is_deterministic() {
        assert_eq!(compose_instructions("C9"), compose_instructions("C9"));
    }
}
