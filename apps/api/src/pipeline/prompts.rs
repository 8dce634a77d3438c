// Prompt templates for the generate → review → analyze stages.
// Placeholders are `{name}` and are filled with `str::replace`.

/// Generator template. Replace `{career_data}`, `{job_block}`,
/// `{feedback_block}`, `{page_instruction}` and `{footer}`.
pub const GENERATOR_PROMPT_TEMPLATE: &str = r#"You are an expert resume writer and ATS optimization specialist.

Generate a professional, ATS-optimized resume based on the following career information.

USER'S CAREER DATA:
{career_data}

{job_block}{feedback_block}

OUTPUT INSTRUCTIONS:
Generate a structured resume in JSON format with the following sections:
1. header - Contact information and professional title
2. summary - Two or three sentence professional summary
3. experience - Work experience entries with achievements
4. education - Educational background
5. skills - Technical and soft skills, organized by category
6. certifications - Professional certifications (if any)
7. projects - Notable projects (if any)

IMPORTANT:
- Use action verbs and quantifiable achievements
- Optimize for ATS keyword scanning
- Keep descriptions concise but impactful
- Only use facts present in the career data
- Tailor content to the job description if provided{page_instruction}

{footer}"#;

pub const GENERAL_PURPOSE_INSTRUCTION: &str = "Generate a general-purpose resume.";

/// Added for candidates with less than `SINGLE_PAGE_YEARS` of experience.
pub const SINGLE_PAGE_INSTRUCTION: &str = "\n- IMPORTANT: Keep the resume concise enough to fit on a SINGLE PAGE \
(limit experience bullet points to 2-3 per role, focus on most impactful achievements only)";

pub const SINGLE_PAGE_YEARS: f64 = 5.0;

/// Reviewer template. Replace `{resume_json}`, `{job_block}` and `{footer}`.
pub const REVIEWER_PROMPT_TEMPLATE: &str = r#"You are an expert resume reviewer and ATS specialist.

Review the following generated resume content and provide detailed feedback.

GENERATED RESUME:
{resume_json}

{job_block}

REVIEW CRITERIA:
1. ATS Optimization - Are keywords properly used? Will it pass ATS scans?
2. Content Quality - Are achievements quantified? Is language impactful?
3. Structure - Is the format clean and professional?
4. Relevance - Does content align with the target role?
5. Grammar & Clarity - Are there any errors or unclear statements?

OUTPUT FORMAT (JSON):
{
    "overall_quality": "excellent|good|fair|poor",
    "ats_score": 0-100,
    "strengths": ["list of strengths"],
    "weaknesses": ["list of weaknesses"],
    "suggestions": ["list of specific improvements"],
    "missing_keywords": ["keywords from JD not in resume"],
    "should_regenerate": true/false,
    "regeneration_reason": "reason if should_regenerate is true"
}

{footer}"#;

pub const GENERAL_REVIEW_INSTRUCTION: &str = "Review for general quality.";

/// Analyzer template. Replace `{resume_json}`, `{job_text}`, `{ats_score}`,
/// `{quality}` and `{footer}`.
pub const ANALYZER_PROMPT_TEMPLATE: &str = r#"You are an expert job match analyzer.

Analyze how well this resume matches the job requirements.

RESUME CONTENT:
{resume_json}

JOB DESCRIPTION:
{job_text}

REVIEW FEEDBACK:
ATS Score: {ats_score}
Quality: {quality}

ANALYSIS REQUIREMENTS:
1. Calculate an overall match score (0-100)
2. Identify key matching qualifications
3. Identify gaps or missing requirements
4. Provide specific recommendations to improve match
5. Assess competitiveness against other candidates

OUTPUT FORMAT (JSON):
{
    "match_score": 0-100,
    "match_level": "excellent|strong|moderate|weak",
    "matching_qualifications": ["list of matching points"],
    "gaps": ["missing requirements or skills"],
    "recommendations": ["specific improvements"],
    "competitive_assessment": "summary of candidate's competitive position",
    "key_strengths": ["top 3 strengths for this role"],
    "interview_tips": ["tips for interview based on this match"]
}

{footer}"#;

pub const GENERAL_MARKETABILITY_INSTRUCTION: &str =
    "No specific job provided - analyze general marketability.";

pub const NOT_AVAILABLE: &str = "N/A";
