/// Strip every tag and attribute from user-supplied text, keeping the text.
pub fn clean(text: &str) -> String {
    ammonia::Builder::empty().clean(text).to_string()
}
