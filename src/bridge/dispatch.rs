//! Shell-to-script call marshaling.

use crate::core::{BridgeError, BridgeResult, ExitStatus, EXECUTION_FAILURE, EXECUTION_SUCCESS};
use crate::host::WordList;
use crate::scripting::ScriptReturn;

/// Script arguments for a word list: every non-empty word, in order.
pub fn marshal_args(words: &WordList) -> Vec<String> {
    words
        .iter()
        .filter(|word| !word.is_empty())
        .map(|word| word.text.clone())
        .collect()
}

/// Map a script return value onto a shell exit status.
///
/// Unexpected types come back as `Err(UnexpectedReturnType)`, whose exit
/// status is still success.
pub fn exit_status(ret: &ScriptReturn) -> BridgeResult<ExitStatus> {
    match ret {
        ScriptReturn::Number(n) => Ok(n.trunc() as ExitStatus),
        ScriptReturn::Bool(true) => Ok(EXECUTION_SUCCESS),
        ScriptReturn::Bool(false) => Ok(EXECUTION_FAILURE),
        ScriptReturn::Nil => Ok(EXECUTION_SUCCESS),
        ScriptReturn::Other(type_name) => {
            Err(BridgeError::UnexpectedReturnType(type_name.clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{Word, WordFlags};

    #[test]
    fn test_marshal_skips_empty_words() {
        let mut words: WordList = ["a", "", "b"].into_iter().collect();
        words.push(Word::with_flags("", WordFlags::QUOTED));
        words.push("c");
        assert_eq!(marshal_args(&words), vec!["a", "b", "c"]);
        assert!(marshal_args(&WordList::new()).is_empty());
    }

    #[test]
    fn test_return_mapping() {
        assert_eq!(exit_status(&ScriptReturn::Number(0.0)).unwrap(), 0);
        assert_eq!(exit_status(&ScriptReturn::Number(5.0)).unwrap(), 5);
        assert_eq!(exit_status(&ScriptReturn::Number(2.9)).unwrap(), 2);
        assert_eq!(exit_status(&ScriptReturn::Number(f64::NAN)).unwrap(), 0);
        assert_eq!(exit_status(&ScriptReturn::Bool(true)).unwrap(), 0);
        assert_eq!(exit_status(&ScriptReturn::Bool(false)).unwrap(), 1);
        assert_eq!(exit_status(&ScriptReturn::Nil).unwrap(), 0);

        let err = exit_status(&ScriptReturn::Other("object".to_string())).unwrap_err();
        assert!(matches!(err, BridgeError::UnexpectedReturnType(_)));
        assert_eq!(err.exit_status(), 0);
    }
}
